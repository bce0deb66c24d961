use crate::Value;
use std::borrow::Cow;

/// A named bind parameter: the column name as it appears in the statement,
/// the `@` placeholder written into generated SQL, and the bound value. The
/// `primary_key` flag separates SET targets from WHERE targets when
/// generating UPDATE statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Cow<'static, str>,
    pub value: Value,
    pub primary_key: bool,
    placeholder: String,
}

impl Parameter {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            placeholder: format!("@{}", name),
            name,
            value: value.into(),
            primary_key: false,
        }
    }

    pub fn primary_key(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, value)
        }
    }

    /// Placeholder text rendered into statements, e.g. `@Name`.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}
