// Not every test binary exercises the whole mock surface.
#![allow(dead_code)]

use anyhow::{Context as _, anyhow, bail};
use silo::{
    Command, CommandKind, Connection, Driver, GENERIC_SQL_WRITER, RowLabeled, RowNames, Rows,
    SqlWriter, Value,
};
use std::collections::HashMap;

/// In-memory backend interpreting the statements the library generates:
/// quoted identifiers, `@` placeholders, conjunctive equality predicates and
/// the `<table>_Operation` procedure names.
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(&self, _url: &str) -> anyhow::Result<Self::Connection> {
        Ok(MockConnection::new())
    }

    fn sql_writer(&self) -> &'static dyn SqlWriter {
        &GENERIC_SQL_WRITER
    }
}

#[derive(Clone)]
struct Table {
    labels: RowNames,
    rows: Vec<Vec<Value>>,
    /// Auto-increment key column, when the table has one.
    key: Option<String>,
    next_id: i64,
}

impl Table {
    fn label_index(&self, label: &str) -> anyhow::Result<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .with_context(|| format!("unknown column {}", label))
    }
}

pub struct MockConnection {
    tables: HashMap<String, Table>,
    snapshot: Option<HashMap<String, Table>>,
    /// Every statement text received, in order.
    pub statements: Vec<String>,
    /// When set, any statement containing the text fails.
    pub fail_on: Option<String>,
}

fn unquote(text: &str) -> String {
    text.trim()
        .trim_matches('"')
        .replace("\"\"", "\"")
}

/// Integer comparison across value widths, exact comparison otherwise.
fn loose_eq(a: &Value, b: &Value) -> bool {
    fn as_int(v: &Value) -> Option<i128> {
        match v {
            Value::Int8(Some(v)) => Some(*v as i128),
            Value::Int16(Some(v)) => Some(*v as i128),
            Value::Int32(Some(v)) => Some(*v as i128),
            Value::Int64(Some(v)) => Some(*v as i128),
            Value::UInt8(Some(v)) => Some(*v as i128),
            Value::UInt16(Some(v)) => Some(*v as i128),
            Value::UInt32(Some(v)) => Some(*v as i128),
            Value::UInt64(Some(v)) => Some(*v as i128),
            _ => None,
        }
    }
    match (as_int(a), as_int(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

type ResultSet = (RowNames, Vec<Vec<Value>>);

/// Predicate tree mirroring the forms the writer emits: equality terms under
/// optional AND/OR connectives. An empty conjunction matches every row.
enum Pred {
    Term(String, Value),
    And(Vec<Pred>),
    Or(Vec<Pred>),
}

impl Pred {
    fn all() -> Self {
        Pred::And(Vec::new())
    }

    fn matches(&self, table: &Table, row: &[Value]) -> anyhow::Result<bool> {
        Ok(match self {
            Pred::Term(column, expected) => {
                let at = table.label_index(column)?;
                loose_eq(&row[at], expected)
            }
            Pred::And(parts) => {
                for part in parts {
                    if !part.matches(table, row)? {
                        return Ok(false);
                    }
                }
                true
            }
            Pred::Or(parts) => {
                let mut any = false;
                for part in parts {
                    if part.matches(table, row)? {
                        any = true;
                        break;
                    }
                }
                any
            }
        })
    }
}

/// Drop grouping parentheses that wrap the entire clause.
fn strip_outer_parens(clause: &str) -> &str {
    let clause = clause.trim();
    if !clause.starts_with('(') || !clause.ends_with(')') {
        return clause;
    }
    let bytes = clause.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return if i == bytes.len() - 1 {
                        strip_outer_parens(&clause[1..i])
                    } else {
                        clause
                    };
                }
            }
            _ => {}
        }
    }
    clause
}

/// Split on a connective token at parenthesis depth zero, outside string
/// literals.
fn split_top_level<'a>(clause: &'a str, token: &str) -> Vec<&'a str> {
    let bytes = clause.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth -= 1,
            _ => {}
        }
        if !in_string && depth == 0 && clause[i..].starts_with(token) {
            parts.push(&clause[start..i]);
            i += token.len();
            start = i;
            continue;
        }
        i += 1;
    }
    parts.push(&clause[start..]);
    parts
}

fn parse_operand(operand: &str, params: &HashMap<String, Value>) -> anyhow::Result<Value> {
    let operand = operand.trim();
    if let Some(name) = operand.strip_prefix('@') {
        params
            .get(name)
            .cloned()
            .with_context(|| format!("unbound placeholder @{}", name))
    } else if let Some(text) = operand.strip_prefix('\'') {
        Ok(Value::Varchar(Some(
            text.trim_end_matches('\'').replace("''", "'"),
        )))
    } else {
        Ok(Value::Int64(Some(operand.parse()?)))
    }
}

fn parse_pred(clause: &str, params: &HashMap<String, Value>) -> anyhow::Result<Pred> {
    let clause = strip_outer_parens(clause);
    let disjuncts = split_top_level(clause, " OR ");
    if disjuncts.len() > 1 {
        return Ok(Pred::Or(
            disjuncts
                .iter()
                .map(|d| parse_pred(d, params))
                .collect::<anyhow::Result<_>>()?,
        ));
    }
    let conjuncts = split_top_level(clause, " AND ");
    if conjuncts.len() > 1 {
        return Ok(Pred::And(
            conjuncts
                .iter()
                .map(|c| parse_pred(c, params))
                .collect::<anyhow::Result<_>>()?,
        ));
    }
    let (column, operand) = clause
        .split_once(" = ")
        .with_context(|| format!("unsupported predicate term {}", clause))?;
    Ok(Pred::Term(unquote(column), parse_operand(operand, params)?))
}

/// `"Column" = @Placeholder, ...` pairs from an UPDATE SET list.
fn parse_assignments(
    list: &str,
    params: &HashMap<String, Value>,
) -> anyhow::Result<Vec<(String, Value)>> {
    let list = list.trim();
    if list.is_empty() {
        return Ok(Vec::new());
    }
    list.split(", ")
        .map(|term| {
            let (column, operand) = term
                .split_once(" = ")
                .with_context(|| format!("unsupported assignment {}", term))?;
            let name = operand
                .trim()
                .strip_prefix('@')
                .with_context(|| format!("unsupported value {}", operand))?;
            let value = params
                .get(name)
                .cloned()
                .with_context(|| format!("unbound placeholder @{}", name))?;
            Ok((unquote(column), value))
        })
        .collect()
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            snapshot: None,
            statements: Vec::new(),
            fail_on: None,
        }
    }

    pub fn create_table(&mut self, name: &str, labels: &[&str], key: Option<&str>) {
        self.tables.insert(
            name.into(),
            Table {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                rows: Vec::new(),
                key: key.map(Into::into),
                next_id: 1,
            },
        );
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    fn table_mut(&mut self, name: &str) -> anyhow::Result<&mut Table> {
        let name = unquote(name);
        self.tables
            .get_mut(&name)
            .with_context(|| format!("no such table {}", name))
    }

    fn matching(table: &Table, predicate: &Pred) -> anyhow::Result<Vec<usize>> {
        let mut indexes = Vec::new();
        for (i, row) in table.rows.iter().enumerate() {
            if predicate.matches(table, row)? {
                indexes.push(i);
            }
        }
        Ok(indexes)
    }

    fn select(
        &mut self,
        table: &str,
        projection: &str,
        predicate: &Pred,
    ) -> anyhow::Result<ResultSet> {
        let table = self.table_mut(table)?;
        let indexes = Self::matching(table, predicate)?;
        let (labels, positions): (Vec<String>, Vec<usize>) = if projection.trim() == "*" {
            (
                table.labels.to_vec(),
                (0..table.labels.len()).collect(),
            )
        } else {
            let names: Vec<String> = projection.split(", ").map(unquote).collect();
            let positions = names
                .iter()
                .map(|n| table.label_index(n))
                .collect::<anyhow::Result<_>>()?;
            (names, positions)
        };
        let rows = indexes
            .iter()
            .map(|&i| positions.iter().map(|&p| table.rows[i][p].clone()).collect())
            .collect();
        Ok((labels.into(), rows))
    }

    fn insert(
        &mut self,
        table: &str,
        columns: &[(String, Value)],
        result_label: Option<&str>,
    ) -> anyhow::Result<(u64, Option<ResultSet>)> {
        let table = self.table_mut(table)?;
        let mut row = vec![Value::Null; table.labels.len()];
        for (column, value) in columns {
            let at = table.label_index(column)?;
            row[at] = value.clone();
        }
        let mut generated = None;
        if let Some(key) = table.key.clone() {
            let at = table.label_index(&key)?;
            let id = table.next_id;
            table.next_id += 1;
            row[at] = Value::Int64(Some(id));
            generated = Some(id);
        }
        table.rows.push(row);
        let result = match (result_label, generated) {
            (Some(label), Some(id)) => Some((
                vec![label.to_string()].into(),
                vec![vec![Value::Int64(Some(id))]],
            )),
            (Some(label), None) => Some((vec![label.to_string()].into(), Vec::new())),
            _ => None,
        };
        Ok((1, result))
    }

    fn update(
        &mut self,
        table: &str,
        assignments: &[(String, Value)],
        predicate: &Pred,
    ) -> anyhow::Result<u64> {
        let table = self.table_mut(table)?;
        let indexes = Self::matching(table, predicate)?;
        for &i in &indexes {
            for (column, value) in assignments {
                let at = table.label_index(column)?;
                table.rows[i][at] = value.clone();
            }
        }
        Ok(indexes.len() as u64)
    }

    fn delete(&mut self, table: &str, predicate: &Pred) -> anyhow::Result<u64> {
        let table = self.table_mut(table)?;
        let indexes = Self::matching(table, predicate)?;
        for &i in indexes.iter().rev() {
            table.rows.remove(i);
        }
        Ok(indexes.len() as u64)
    }

    fn run_text(
        &mut self,
        sql: &str,
        params: &HashMap<String, Value>,
    ) -> anyhow::Result<(u64, Option<ResultSet>)> {
        if let Some(rest) = sql.strip_prefix("SELECT ") {
            let (projection, rest) = rest.split_once(" FROM ").context("missing FROM")?;
            let (table, predicate) = match rest.split_once(" WHERE ") {
                Some((table, clause)) => (table, parse_pred(clause, params)?),
                None => (rest, Pred::all()),
            };
            let result = self.select(table, projection, &predicate)?;
            let count = result.1.len() as u64;
            Ok((count, Some(result)))
        } else if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            // The identity clause, when present, names the result column.
            let (rest, result_label) = match rest.split_once("; SELECT ") {
                Some((rest, suffix)) => {
                    let label = suffix
                        .split('"')
                        .nth(1)
                        .context("malformed identity clause")?;
                    (rest, Some(label))
                }
                None => (rest, None),
            };
            let (table, rest) = rest.split_once(" (").context("missing column list")?;
            let (columns, rest) = rest.split_once(") VALUES (").context("missing VALUES")?;
            let placeholders = rest.trim_end().trim_end_matches(')');
            let columns: Vec<(String, Value)> = columns
                .split(", ")
                .zip(placeholders.split(", "))
                .map(|(column, placeholder)| {
                    let name = placeholder
                        .strip_prefix('@')
                        .with_context(|| format!("unsupported value {}", placeholder))?;
                    let value = params
                        .get(name)
                        .cloned()
                        .with_context(|| format!("unbound placeholder @{}", name))?;
                    Ok((unquote(column), value))
                })
                .collect::<anyhow::Result<_>>()?;
            self.insert(table, &columns, result_label)
        } else if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table, rest) = rest.split_once(" SET ").context("missing SET")?;
            let (assignments, predicate) = match rest.split_once(" WHERE ") {
                Some((set, clause)) => (set, parse_pred(clause, params)?),
                None => (rest, Pred::all()),
            };
            let assignments = parse_assignments(assignments, params)?;
            Ok((self.update(table, &assignments, &predicate)?, None))
        } else if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table, predicate) = match rest.split_once(" WHERE ") {
                Some((table, clause)) => (table, parse_pred(clause, params)?),
                None => (rest, Pred::all()),
            };
            Ok((self.delete(table, &predicate)?, None))
        } else {
            bail!("unsupported statement: {}", sql)
        }
    }

    fn run_procedure(
        &mut self,
        name: &str,
        command: &Command,
    ) -> anyhow::Result<(u64, Option<ResultSet>)> {
        let (table, operation) = name
            .rsplit_once('_')
            .with_context(|| format!("unknown procedure {}", name))?;
        let terms: Vec<(String, Value)> = command
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.value.clone()))
            .collect();
        let conjunction = Pred::And(
            terms
                .iter()
                .map(|(column, value)| Pred::Term(column.clone(), value.clone()))
                .collect(),
        );
        match operation {
            "SelectList" | "SelectDetails" => {
                let result = self.select(table, "*", &conjunction)?;
                let count = result.1.len() as u64;
                Ok((count, Some(result)))
            }
            "Insert" => self.insert(table, &terms, Some("Id")),
            "Update" => {
                let assignments: Vec<(String, Value)> = command
                    .parameters
                    .iter()
                    .filter(|p| !p.primary_key)
                    .map(|p| (p.name.to_string(), p.value.clone()))
                    .collect();
                let predicate = Pred::And(
                    command
                        .parameters
                        .iter()
                        .filter(|p| p.primary_key)
                        .map(|p| Pred::Term(p.name.to_string(), p.value.clone()))
                        .collect(),
                );
                Ok((self.update(table, &assignments, &predicate)?, None))
            }
            "Delete" => Ok((self.delete(table, &conjunction)?, None)),
            "GetIdByName" => {
                let key = self
                    .tables
                    .get(table)
                    .and_then(|t| t.key.clone())
                    .with_context(|| format!("table {} has no key", table))?;
                let result = self.select(table, &format!("\"{}\"", key), &conjunction)?;
                let count = result.1.len() as u64;
                Ok((count, Some(result)))
            }
            other => bail!("unknown procedure operation {}", other),
        }
    }

    fn run(&mut self, command: &Command) -> anyhow::Result<(u64, Option<ResultSet>)> {
        self.statements.push(command.sql.clone());
        if let Some(fail) = &self.fail_on {
            if command.sql.contains(fail.as_str()) {
                bail!("simulated backend failure on {}", command.sql);
            }
        }
        let params: HashMap<String, Value> = command
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.value.clone()))
            .collect();
        match command.kind {
            CommandKind::Text => {
                let sql = command.sql.trim().to_string();
                self.run_text(&sql, &params)
            }
            CommandKind::Procedure => {
                let name = command.sql.clone();
                self.run_procedure(&name, command)
            }
        }
    }
}

impl Connection for MockConnection {
    fn execute(&mut self, command: &Command) -> anyhow::Result<u64> {
        self.run(command).map(|(count, _)| count)
    }

    fn fetch<'c>(&'c mut self, command: &Command) -> anyhow::Result<Rows<'c>> {
        let (_, result) = self.run(command)?;
        let (labels, rows) = result.ok_or_else(|| anyhow!("statement returned no rows"))?;
        Ok(Box::new(rows.into_iter().map(move |row| {
            Ok(RowLabeled::new(labels.clone(), row.into_boxed_slice()))
        })))
    }

    fn begin(&mut self) -> anyhow::Result<()> {
        if self.snapshot.is_some() {
            bail!("transaction already open");
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> anyhow::Result<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .context("no open transaction")
    }

    fn rollback(&mut self) -> anyhow::Result<()> {
        let snapshot = self.snapshot.take().context("no open transaction")?;
        self.tables = snapshot;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Table shared by the repository scenarios.
pub fn lookup_connection() -> MockConnection {
    let mut connection = MockConnection::new();
    connection.create_table("Lookup", &["Id", "Name", "Description"], Some("Id"));
    connection
}

/// Quiet unless RUST_LOG asks otherwise.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
