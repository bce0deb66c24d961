use crate::{
    AsValue, ColumnDef, Command, Connection, Entity, Error, Expr, NameTranslator, Operator,
    Parameter, Result, RowLabeled, SqlWriter, TableRef, Value,
};
use std::{any, marker::PhantomData, slice, time::Duration};

/// Column tag marking the lookup-by-name column.
pub const NAME_TAG: &str = "Name";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How statements reach the backend.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Statements generated by the `SqlWriter` and sent as ad-hoc text.
    #[default]
    Query,
    /// Fixed stored-procedure naming convention instead of generated SQL.
    /// Explicit WHERE expressions are rejected in this mode.
    StoredProcedure,
}

/// Generic CRUD facade for one entity type.
///
/// Holds only per-type configuration (mode, timeout, dialect services), no
/// connection and no mutable state: one instance can serve concurrent
/// callers, each operation borrowing a connection for its duration.
pub struct Repository<E: Entity> {
    mode: ExecutionMode,
    timeout: Duration,
    writer: &'static dyn SqlWriter,
    names: &'static dyn NameTranslator,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub fn new(writer: &'static dyn SqlWriter, names: &'static dyn NameTranslator) -> Self {
        Self {
            mode: ExecutionMode::Query,
            timeout: DEFAULT_TIMEOUT,
            writer,
            names,
            entity: PhantomData,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn table(&self) -> TableRef {
        let base = E::table_ref();
        TableRef {
            name: self.names.translate_table(&base.name).into(),
            schema: base.schema.clone(),
        }
    }

    /// Bind parameter for a column, named by its translated physical
    /// identifier and carrying the column's key flag.
    fn parameter(&self, column: &ColumnDef, value: Value) -> Parameter {
        let name = self.names.translate_column(column.name);
        if column.primary_key {
            Parameter::primary_key(name, value)
        } else {
            Parameter::new(name, value)
        }
    }

    /// Translated projection list, aligned with `E::columns()`.
    fn projection(&self) -> Vec<String> {
        E::columns()
            .iter()
            .map(|c| self.names.translate_column(c.name))
            .collect()
    }

    /// Conjunctive equality predicate over the given parameters, `None` when
    /// the list is empty (full-table operation).
    fn conjunction(parameters: &[Parameter]) -> Option<Expr> {
        let mut exprs = parameters
            .iter()
            .map(|p| Expr::parameter(Operator::Equal, p));
        let first = exprs.next()?;
        let rest: Vec<Expr> = exprs.collect();
        if rest.is_empty() {
            Some(first)
        } else {
            let mut operands = vec![first];
            operands.extend(rest);
            Some(Expr::Compound {
                op: Operator::And,
                operands,
                parentheses: true,
            })
        }
    }

    fn key_parameter(&self, value: Value) -> Result<Parameter> {
        let key = E::primary_key_def().ok_or_else(|| {
            Error::Configuration(format!(
                "{} has no primary key column",
                any::type_name::<E>()
            ))
        })?;
        Ok(Parameter::primary_key(
            self.names.translate_column(key.name),
            value,
        ))
    }

    fn select_by_key(&self, key: &Parameter) -> Command {
        match self.mode {
            ExecutionMode::Query => {
                let condition = Expr::parameter(Operator::Equal, key);
                let mut sql = String::with_capacity(128);
                self.writer
                    .write_select(&mut sql, &self.table(), &self.projection(), Some(&condition));
                Command::text(sql, vec![key.clone()], self.timeout)
            }
            ExecutionMode::StoredProcedure => Command::procedure(
                self.names.select_details_procedure(&E::table_ref().name),
                vec![key.clone()],
                self.timeout,
            ),
        }
    }

    fn fetch_first_row<C: Connection>(
        &self,
        connection: &mut C,
        key: &Parameter,
    ) -> Result<Option<RowLabeled>> {
        let command = self.select_by_key(key);
        log::debug!("{}: {}", any::type_name::<E>(), command);
        let mut rows = connection.fetch(&command).map_err(Error::database)?;
        rows.next().transpose().map_err(Error::database)
    }

    /// Retrieve all rows matching `parameters` (conjunctive equality) or an
    /// explicit `condition`. When a condition is supplied it is the final
    /// predicate and the parameters only carry bind values.
    ///
    /// The returned sequence is lazy and single-pass, backed by the open
    /// cursor: it cannot outlive the connection borrow and re-enumerating
    /// requires a fresh call.
    pub fn get_all<'c, C: Connection>(
        &self,
        connection: &'c mut C,
        parameters: &[Parameter],
        condition: Option<&Expr>,
    ) -> Result<impl Iterator<Item = Result<E>> + 'c> {
        let command = match self.mode {
            ExecutionMode::Query => {
                let condition = match condition {
                    Some(expr) => Some(expr.clone()),
                    None => Self::conjunction(parameters),
                };
                let mut sql = String::with_capacity(128);
                self.writer
                    .write_select(&mut sql, &self.table(), &self.projection(), condition.as_ref());
                Command::text(sql, parameters.to_vec(), self.timeout)
            }
            ExecutionMode::StoredProcedure => {
                if condition.is_some() {
                    return Err(Error::ProcedureMode("filter expression"));
                }
                Command::procedure(
                    self.names.select_list_procedure(&E::table_ref().name),
                    parameters.to_vec(),
                    self.timeout,
                )
            }
        };
        log::debug!("{}: {}", any::type_name::<E>(), command);
        let rows = connection.fetch(&command).map_err(Error::database)?;
        Ok(rows.map(|row| {
            row.map_err(Error::database)
                .and_then(|row| E::from_row(&row))
        }))
    }

    /// Retrieve one entity by primary key, `None` when missing.
    pub fn get<C: Connection>(&self, connection: &mut C, id: i64) -> Result<Option<E>> {
        if id <= 0 {
            return Err(Error::Configuration(format!(
                "invalid id {id}, must be positive"
            )));
        }
        let key = self.key_parameter(Value::Int64(Some(id)))?;
        match self.fetch_first_row(connection, &key)? {
            Some(row) => Ok(Some(E::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Persist the entity: INSERT when its primary key still holds the
    /// type's zero value, UPDATE otherwise. Exactly one of the two statements
    /// executes; an INSERT writes the generated key back onto the entity.
    pub fn save<C: Connection>(&self, connection: &mut C, entity: &mut E) -> Result<Value> {
        if entity.is_new() {
            self.insert(connection, entity)
        } else {
            self.update(connection, entity)
        }
    }

    fn insert<C: Connection>(&self, connection: &mut C, entity: &mut E) -> Result<Value> {
        let params: Vec<Parameter> = entity
            .row()
            .into_iter()
            .filter(|(c, _)| c.in_insert())
            .map(|(c, v)| {
                c.check(&v)?;
                Ok(self.parameter(c, v))
            })
            .collect::<Result<_>>()?;
        let capture_key = E::primary_key_def().is_some();
        let command = match self.mode {
            ExecutionMode::Query => {
                let mut sql = String::with_capacity(128);
                self.writer
                    .write_insert(&mut sql, &self.table(), &params, capture_key);
                Command::text(sql, params, self.timeout)
            }
            ExecutionMode::StoredProcedure => Command::procedure(
                self.names.insert_procedure(&E::table_ref().name),
                params,
                self.timeout,
            ),
        };
        log::debug!("{}: {}", any::type_name::<E>(), command);
        if capture_key {
            let id = connection.fetch_scalar(&command).map_err(Error::database)?;
            entity.set_primary_key(id.clone())?;
            Ok(id)
        } else {
            connection.execute(&command).map_err(Error::database)?;
            Ok(Value::Null)
        }
    }

    fn update<C: Connection>(&self, connection: &mut C, entity: &E) -> Result<Value> {
        let params: Vec<Parameter> = entity
            .row()
            .into_iter()
            .filter(|(c, _)| c.in_update() || c.primary_key)
            .map(|(c, v)| {
                if c.in_update() {
                    c.check(&v)?;
                }
                Ok(self.parameter(c, v))
            })
            .collect::<Result<_>>()?;
        let command = match self.mode {
            ExecutionMode::Query => {
                let mut sql = String::with_capacity(128);
                self.writer.write_update(&mut sql, &self.table(), &params);
                Command::text(sql, params, self.timeout)
            }
            ExecutionMode::StoredProcedure => Command::procedure(
                self.names.update_procedure(&E::table_ref().name),
                params,
                self.timeout,
            ),
        };
        log::debug!("{}: {}", any::type_name::<E>(), command);
        connection.execute(&command).map_err(Error::database)?;
        Ok(entity.primary_key())
    }

    /// Identify the entity that failed a batch save, whatever the failure
    /// class: execution errors gain an anyhow context layer, fail-fast
    /// errors carry it in their message.
    fn batch_context(error: Error, key: &Value) -> Error {
        let context = format!(
            "failed to save {} with key {:?}",
            any::type_name::<E>(),
            key
        );
        match error {
            Error::Database(cause) => Error::Database(cause.context(context)),
            Error::Validation(message) => Error::Validation(format!("{context}: {message}")),
            Error::Configuration(message) => Error::Configuration(format!("{context}: {message}")),
            other => other,
        }
    }

    /// Save every entity inside one transaction. When the connection already
    /// carries a caller-managed transaction it is used as-is; otherwise one
    /// is opened and committed here, and the first failure rolls the whole
    /// batch back.
    pub fn save_all<C: Connection>(&self, connection: &mut C, entities: &mut [E]) -> Result<()> {
        let owns_transaction = !connection.in_transaction();
        if owns_transaction {
            connection.begin().map_err(Error::database)?;
        }
        for entity in entities.iter_mut() {
            let key = entity.primary_key();
            if let Err(error) = self.save(connection, entity) {
                if owns_transaction {
                    if let Err(rollback) = connection.rollback() {
                        log::error!("rollback failed: {:#}", rollback);
                    }
                }
                return Err(Self::batch_context(error, &key));
            }
        }
        if owns_transaction {
            connection.commit().map_err(Error::database)?;
        }
        Ok(())
    }

    /// Remove the row backing the entity. Returns the affected row count;
    /// a row that is already gone is a no-op, not an error.
    pub fn delete<C: Connection>(&self, connection: &mut C, entity: &E) -> Result<u64> {
        let key = entity.primary_key();
        if key.is_default() {
            return Err(Error::Configuration(format!(
                "cannot delete an unsaved {}",
                any::type_name::<E>()
            )));
        }
        let key = self.key_parameter(key)?;
        self.delete_where(connection, slice::from_ref(&key), None)
    }

    pub fn delete_by_id<C: Connection>(&self, connection: &mut C, id: i64) -> Result<u64> {
        if id <= 0 {
            return Err(Error::Configuration(format!(
                "invalid id {id}, must be positive"
            )));
        }
        let key = self.key_parameter(Value::Int64(Some(id)))?;
        self.delete_where(connection, slice::from_ref(&key), None)
    }

    /// Remove all rows matching `parameters` or an explicit `condition`.
    /// With neither, every row goes (full-table delete).
    pub fn delete_where<C: Connection>(
        &self,
        connection: &mut C,
        parameters: &[Parameter],
        condition: Option<&Expr>,
    ) -> Result<u64> {
        let command = match self.mode {
            ExecutionMode::Query => {
                let condition = match condition {
                    Some(expr) => Some(expr.clone()),
                    None => Self::conjunction(parameters),
                };
                let mut sql = String::with_capacity(64);
                self.writer
                    .write_delete(&mut sql, &self.table(), condition.as_ref());
                Command::text(sql, parameters.to_vec(), self.timeout)
            }
            ExecutionMode::StoredProcedure => {
                if condition.is_some() {
                    return Err(Error::ProcedureMode("filter expression"));
                }
                Command::procedure(
                    self.names.delete_procedure(&E::table_ref().name),
                    parameters.to_vec(),
                    self.timeout,
                )
            }
        };
        log::debug!("{}: {}", any::type_name::<E>(), command);
        connection.execute(&command).map_err(Error::database)
    }

    /// Re-fetch by primary key and overwrite the instance's fields in place.
    /// Returns `false` (does not fail) when the row no longer exists.
    pub fn reload<C: Connection>(&self, connection: &mut C, entity: &mut E) -> Result<bool> {
        let key = entity.primary_key();
        if key.is_default() {
            return Err(Error::Configuration(format!(
                "cannot reload an unsaved {}",
                any::type_name::<E>()
            )));
        }
        let key = self.key_parameter(key)?;
        match self.fetch_first_row(connection, &key)? {
            Some(row) => {
                entity.load_row(&row)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolve a primary key through the column tagged `"Name"`. Fails fast
    /// with a configuration error when the entity declares no such column.
    pub fn get_id_by_name<C: Connection>(
        &self,
        connection: &mut C,
        name: &str,
    ) -> Result<Option<i64>> {
        let column = E::tagged_column(NAME_TAG).ok_or_else(|| {
            Error::Configuration(format!(
                "{} has no column tagged {:?}",
                any::type_name::<E>(),
                NAME_TAG
            ))
        })?;
        let key = E::primary_key_def().ok_or_else(|| {
            Error::Configuration(format!(
                "{} has no primary key column",
                any::type_name::<E>()
            ))
        })?;
        let parameter = self.parameter(column, Value::Varchar(Some(name.into())));
        let command = match self.mode {
            ExecutionMode::Query => {
                let condition = Expr::parameter(Operator::Equal, &parameter);
                let projection = vec![self.names.translate_column(key.name)];
                let mut sql = String::with_capacity(96);
                self.writer
                    .write_select(&mut sql, &self.table(), &projection, Some(&condition));
                Command::text(sql, vec![parameter], self.timeout)
            }
            ExecutionMode::StoredProcedure => Command::procedure(
                self.names.id_by_name_function(&E::table_ref().name),
                vec![parameter],
                self.timeout,
            ),
        };
        log::debug!("{}: {}", any::type_name::<E>(), command);
        let value = connection.fetch_scalar(&command).map_err(Error::database)?;
        if value.is_null() {
            Ok(None)
        } else {
            i64::try_from_value(value).map(Some)
        }
    }
}
