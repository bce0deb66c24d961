use crate::{Command, DEFAULT_NAMES, NameTranslator, RowLabeled, SqlWriter, Value};
use std::time::Duration;

/// Lazy, single-pass, forward-only sequence of result rows. The borrow ties
/// it to the connection that produced it: consuming it past the connection's
/// lifetime is rejected at compile time.
pub type Rows<'c> = Box<dyn Iterator<Item = anyhow::Result<RowLabeled>> + 'c>;

/// A database backend: a factory for connections plus the dialect services
/// (SQL writer, name translation) the data layer needs to target it.
pub trait Driver {
    type Connection: Connection;

    fn connect(&self, url: &str) -> anyhow::Result<Self::Connection>;
    fn sql_writer(&self) -> &'static dyn SqlWriter;
    fn names(&self) -> &'static dyn NameTranslator {
        &DEFAULT_NAMES
    }
}

/// Execution seam implemented by backends. Methods return raw driver errors;
/// the repository facade wraps them exactly once into `Error::Database`.
///
/// The model is synchronous call/return: one connection serves one operation
/// at a time, and a transaction opened with `begin` stays bound to it.
pub trait Connection {
    /// Run a modifying command, returning the number of rows affected.
    fn execute(&mut self, command: &Command) -> anyhow::Result<u64>;

    /// Run a query returning its rows as a lazy cursor-backed sequence.
    fn fetch<'c>(&'c mut self, command: &Command) -> anyhow::Result<Rows<'c>>;

    /// Run a query returning the first column of the first row, or
    /// `Value::Null` when the result set is empty.
    fn fetch_scalar(&mut self, command: &Command) -> anyhow::Result<Value> {
        let mut rows = self.fetch(command)?;
        match rows.next().transpose()? {
            Some(row) => Ok(row.values.first().cloned().unwrap_or(Value::Null)),
            None => Ok(Value::Null),
        }
    }

    fn begin(&mut self) -> anyhow::Result<()>;
    fn commit(&mut self) -> anyhow::Result<()>;
    fn rollback(&mut self) -> anyhow::Result<()>;

    /// Whether a caller-managed transaction is currently open.
    fn in_transaction(&self) -> bool;

    /// Minimum timeout the backend enforces regardless of configuration.
    fn timeout_floor(&self) -> Duration {
        Duration::ZERO
    }
}
