mod expr;
mod operator;

pub use expr::*;
pub use operator::*;
