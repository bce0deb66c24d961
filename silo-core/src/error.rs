use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure while constructing an expression tree. These are raised by the
/// `Expr` constructors, never at render time.
#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("operand name cannot be empty")]
    EmptyName,
    #[error("operator {operator} requires at least {minimum} operands, got {actual}")]
    TooFewOperands {
        operator: &'static str,
        minimum: usize,
        actual: usize,
    },
}

/// Unified error type surfaced by the data layer.
///
/// Execution failures raised by a driver are wrapped exactly once into
/// [`Error::Database`] carrying the original cause. Not-found outcomes are
/// not errors: `get` returns `None`, `reload` returns `false` and `delete`
/// reports zero affected rows.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error("database error")]
    Database(#[source] anyhow::Error),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid value: {0}")]
    Validation(String),
    #[error("{0} is not supported in stored procedure mode")]
    ProcedureMode(&'static str),
    #[error("cannot convert value: {0}")]
    Conversion(String),
}

impl Error {
    /// Wrap a driver failure, preserving it as the source cause.
    pub fn database(cause: impl Into<anyhow::Error>) -> Self {
        Error::Database(cause.into())
    }
}
