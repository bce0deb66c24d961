use crate::{
    ExpressionError, Operator, Parameter, Value,
    writer::{Context, SqlWriter},
};

/// A renderable WHERE-clause expression node.
///
/// Leaves are raw identifiers (`Name`), quoted identifiers (`QuotedName`)
/// and literals (`Value`); compound nodes combine operands under an
/// operator. Trees are built per call, rendered once and discarded.
///
/// All arity checking happens in the constructors: a successfully built
/// expression always renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Raw identifier text, written as-is.
    Name(String),
    /// Identifier quoted by the dialect writer.
    QuotedName(String),
    /// Literal value, dialect-escaped at render time.
    Value(Value),
    Compound {
        op: Operator,
        operands: Vec<Expr>,
        parentheses: bool,
    },
}

impl Expr {
    /// Raw identifier operand. Fails on empty or whitespace-only text.
    pub fn name(text: impl Into<String>) -> Result<Self, ExpressionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExpressionError::EmptyName);
        }
        Ok(Expr::Name(text))
    }

    /// Identifier operand rendered with dialect quoting.
    pub fn quoted_name(text: impl Into<String>) -> Result<Self, ExpressionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExpressionError::EmptyName);
        }
        Ok(Expr::QuotedName(text))
    }

    /// Literal operand.
    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    /// N-ary compound node. Fails when `operands` is shorter than the
    /// operator's declared minimum.
    pub fn compound(
        op: Operator,
        operands: Vec<Expr>,
        parentheses: bool,
    ) -> Result<Self, ExpressionError> {
        if operands.len() < op.min_operands() {
            return Err(ExpressionError::TooFewOperands {
                operator: op.token(),
                minimum: op.min_operands(),
                actual: operands.len(),
            });
        }
        Ok(Expr::Compound {
            op,
            operands,
            parentheses,
        })
    }

    fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compound {
            op,
            operands: vec![lhs, rhs],
            parentheses: false,
        }
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(Operator::Equal, lhs, rhs)
    }

    pub fn not_equal(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(Operator::NotEqual, lhs, rhs)
    }

    pub fn greater(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(Operator::Greater, lhs, rhs)
    }

    pub fn greater_equal(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(Operator::GreaterEqual, lhs, rhs)
    }

    pub fn less(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(Operator::Less, lhs, rhs)
    }

    /// N-ary conjunction, parenthesized by default.
    pub fn and(operands: Vec<Expr>) -> Result<Self, ExpressionError> {
        Self::compound(Operator::And, operands, true)
    }

    /// N-ary disjunction, parenthesized by default.
    pub fn or(operands: Vec<Expr>) -> Result<Self, ExpressionError> {
        Self::compound(Operator::Or, operands, true)
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Compound {
            op: Operator::Not,
            operands: vec![operand],
            parentheses: false,
        }
    }

    /// `column op @placeholder` predicate from a bound parameter. Both sides
    /// are raw names: the column name goes through name translation upstream
    /// and the placeholder is the driver's binding token.
    pub fn parameter(op: Operator, parameter: &Parameter) -> Self {
        Self::binary(
            op,
            Expr::Name(parameter.name.to_string()),
            Expr::Name(parameter.placeholder().to_owned()),
        )
    }

    /// Serialize this node into the output string using the sql writer.
    pub fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_expression(context, out, self);
    }
}
