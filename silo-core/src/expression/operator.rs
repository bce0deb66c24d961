use std::fmt::{self, Display, Formatter};

/// How many operands an operator consumes. `Nullary` is reserved for bare
/// marker operators; no current operator uses it but the renderer handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Nullary,
    Unary,
    Nary,
}

/// Predicate operators available to [`Expr`](crate::Expr) nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    And,
    Or,
}

impl Operator {
    pub fn arity(&self) -> Arity {
        match self {
            Operator::Not => Arity::Unary,
            _ => Arity::Nary,
        }
    }

    /// Minimum operand count accepted by the `Expr` constructors.
    pub fn min_operands(&self) -> usize {
        match self.arity() {
            Arity::Nullary => 0,
            Arity::Unary => 1,
            Arity::Nary => 2,
        }
    }

    /// SQL token for this operator.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Not => "NOT",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
