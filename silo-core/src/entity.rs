use crate::{ColumnDef, Result, RowLabeled, TableRef, Value};

/// A record type mapped to one database table.
///
/// The static side (`table_ref`, `columns`) is the metadata seam: a fixed,
/// ordered column descriptor list built once per type, normally by
/// `#[derive(Entity)]`. The instance side (`from_row`, `load_row`, `row`)
/// is the factory seam converting between result rows and field values,
/// with DB-NULL coercing to each field's zero value.
pub trait Entity: Sized {
    fn table_ref() -> &'static TableRef;

    /// Ordered column descriptors, one per mapped field.
    fn columns() -> &'static [ColumnDef];

    /// The primary key descriptor. With several key-flagged columns the
    /// first match wins; composite keys are not supported.
    fn primary_key_def() -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.primary_key)
    }

    /// First column carrying the given tag, e.g. `"Name"`.
    fn tagged_column(tag: &str) -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.tag == Some(tag))
    }

    /// Materialize a fresh instance from a result row.
    fn from_row(row: &RowLabeled) -> Result<Self>;

    /// Overwrite this instance's fields in place from a result row.
    fn load_row(&mut self, row: &RowLabeled) -> Result<()>;

    /// Current column values, aligned with `columns()`.
    fn row(&self) -> Vec<(&'static ColumnDef, Value)>;

    /// Current primary key value; `Value::Null` when the type has no key.
    fn primary_key(&self) -> Value;

    /// Write a (generated) key back onto the instance.
    fn set_primary_key(&mut self, value: Value) -> Result<()>;

    /// Whether the entity has never been saved: its primary key still holds
    /// the type's zero value.
    fn is_new(&self) -> bool {
        self.primary_key().is_default()
    }
}
