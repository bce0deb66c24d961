use crate::{Error, Result, Value};

/// Declarative description of a table column attached to one entity field.
///
/// Descriptors are built once per entity type (by `#[derive(Entity)]`) and
/// live in a static slice; the rest of the crate only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name (may differ from the field name).
    pub name: &'static str,
    /// `Value` prototype describing the column type.
    pub value: Value,
    /// Nullability flag. A non-nullable descriptor forbids storing absence
    /// even when the mapped field could represent it.
    pub nullable: bool,
    /// Primary key flag. Implies `read_only`.
    pub primary_key: bool,
    /// Read-only columns never appear in INSERT or UPDATE value lists.
    pub read_only: bool,
    /// String columns only: rejects empty/whitespace content when not null.
    pub non_empty: bool,
    /// String columns only: maximum length, `None` means unbounded.
    pub max_length: Option<u32>,
    /// Optional label used to locate semantically special columns,
    /// e.g. the `"Name"` column backing lookup-by-name.
    pub tag: Option<&'static str>,
}

impl ColumnDef {
    /// Whether the column participates in INSERT value lists: primary key
    /// columns are skipped (the engine generates them), read-only columns
    /// always are.
    pub fn in_insert(&self) -> bool {
        !self.primary_key && !self.read_only
    }

    /// Whether the column participates in UPDATE SET lists. Same rule as
    /// INSERT: the primary key only ever appears in the WHERE clause.
    pub fn in_update(&self) -> bool {
        !self.primary_key && !self.read_only
    }

    /// Check a value against the column's constraints. Runs before any I/O:
    /// a violation fails the whole statement synchronously.
    pub fn check(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(Error::Validation(format!(
                    "column {} cannot be null",
                    self.name
                )));
            }
            return Ok(());
        }
        if let Value::Varchar(Some(v)) = value {
            if self.non_empty && v.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "column {} cannot be empty",
                    self.name
                )));
            }
            if let Some(max) = self.max_length {
                if v.chars().count() > max as usize {
                    return Err(Error::Validation(format!(
                        "column {} exceeds the maximum length of {}",
                        self.name, max
                    )));
                }
            }
        }
        Ok(())
    }
}
