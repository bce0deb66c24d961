use crate::{
    Arity, Expr, Operator, Parameter, TableRef, Value, possibly_parenthesized, separated_by,
    writer::{Context, Fragment},
};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let mut buffer = ryu::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Dialect printer converting semantic constructs into concrete SQL text.
///
/// The default methods implement the generic dialect; writers for specific
/// engines override the hooks they need (identifier quoting, literal forms,
/// the identity-retrieval clause). Writers are stateless: one instance per
/// dialect serves the whole process.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` with `replace` while copying into the buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference, schema-qualified when a schema is set.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(context, out),
            Value::Boolean(Some(v)) => self.write_value_bool(context, out, *v),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v), ..) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(context, out, v),
            Value::Blob(Some(v)) => self.write_value_blob(context, out, v.as_ref()),
            Value::Date(Some(v)) => self.write_value_date(context, out, v, false),
            Value::Time(Some(v)) => self.write_value_time(context, out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(context, out, v),
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => log::error!("Cannot write {:?}", value),
        };
    }

    /// Render NULL literal.
    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    /// Render boolean literal as an upper-case token.
    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["FALSE", "TRUE"][value as usize]);
    }

    /// Render a string literal using single quotes, doubling embedded quotes.
    fn write_value_string(&self, _context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        let mut pos = 0;
        for (i, c) in value.char_indices() {
            if c == '\'' {
                out.push_str(&value[pos..i]);
                out.push_str("''");
                pos = i + 1;
            }
        }
        out.push_str(&value[pos..]);
        out.push('\'');
    }

    /// Render a blob literal using hex escapes.
    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push('\'');
        for b in value {
            let _ = write!(out, "\\x{:X}", b);
        }
        out.push('\'');
    }

    /// Render a DATE literal (optionally as part of TIMESTAMP composition).
    fn write_value_date(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Date,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    /// Render a TIME literal (optionally as part of TIMESTAMP composition).
    fn write_value_time(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Time,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:02}:{:02}:{:02}{b}",
            value.hour(),
            value.minute(),
            value.second()
        );
    }

    /// Render a TIMESTAMP literal.
    fn write_value_timestamp(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PrimitiveDateTime,
    ) {
        out.push('\'');
        self.write_value_date(context, out, &value.date(), true);
        out.push('T');
        self.write_value_time(context, out, &value.time(), true);
        out.push('\'');
    }

    /// SQL token for a predicate operator (dialect may override).
    fn operator_token(&self, op: &Operator) -> &'static str {
        op.token()
    }

    /// Render an expression node.
    ///
    /// Unary operators print `OP operand`; n-ary operators interleave the
    /// token between operands and wrap the whole run in parentheses when the
    /// node asks for them. The reserved nullary form prints a lone token.
    fn write_expression(&self, context: &mut Context, out: &mut String, expr: &Expr) {
        match expr {
            Expr::Name(v) => out.push_str(v),
            Expr::QuotedName(v) => self.write_identifier_quoted(context, out, v),
            Expr::Value(v) => self.write_value(context, out, v),
            Expr::Compound {
                op,
                operands,
                parentheses,
            } => {
                let token = self.operator_token(op);
                match op.arity() {
                    Arity::Nullary => {
                        out.push(' ');
                        out.push_str(token);
                    }
                    Arity::Unary => {
                        out.push_str(token);
                        out.push(' ');
                        if let Some(operand) = operands.first() {
                            self.write_expression(context, out, operand);
                        }
                    }
                    Arity::Nary => {
                        let separator = format!(" {} ", token);
                        possibly_parenthesized!(
                            out,
                            *parentheses,
                            separated_by(
                                out,
                                operands,
                                |out, v| self.write_expression(context, out, v),
                                &separator,
                            )
                        );
                    }
                }
            }
        }
    }

    /// Write ` WHERE ` followed by the expression's rendering.
    fn write_where_clause(&self, context: &mut Context, out: &mut String, expr: &Expr) {
        out.push_str(" WHERE ");
        self.write_expression(context, out, expr);
    }

    /// Emit a SELECT statement over physical column names (already through
    /// name translation). An empty column list projects `*`; without a
    /// condition the WHERE clause is omitted entirely (full-table read).
    fn write_select(
        &self,
        out: &mut String,
        table: &TableRef,
        columns: &[String],
        condition: Option<&Expr>,
    ) {
        let mut context = Context::new(Fragment::SqlSelect);
        out.reserve(64 + columns.len() * 16);
        out.push_str("SELECT ");
        if columns.is_empty() {
            out.push('*');
        } else {
            separated_by(
                out,
                columns,
                |out, c| self.write_identifier_quoted(&mut context, out, c),
                ", ",
            );
        }
        out.push_str(" FROM ");
        self.write_table_ref(&mut context, out, table);
        if let Some(condition) = condition {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            self.write_where_clause(&mut context, out, condition);
        }
    }

    /// Emit an INSERT statement over the given parameters, optionally
    /// followed by the dialect's identity-retrieval clause.
    fn write_insert(
        &self,
        out: &mut String,
        table: &TableRef,
        params: &[Parameter],
        return_generated_id: bool,
    ) {
        let mut context = Context::new(Fragment::SqlInsertInto);
        out.reserve(64 + params.len() * 32);
        out.push_str("INSERT INTO ");
        self.write_table_ref(&mut context, out, table);
        out.push_str(" (");
        separated_by(
            out,
            params,
            |out, p| self.write_identifier_quoted(&mut context, out, &p.name),
            ", ",
        );
        out.push_str(") VALUES (");
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        separated_by(out, params, |out, p| out.push_str(p.placeholder()), ", ");
        out.push(')');
        if return_generated_id {
            self.write_insert_identity_clause(&mut context, out);
        }
    }

    /// Identity retrieval clause appended after an INSERT when the caller
    /// wants the generated key back. Dialects override.
    fn write_insert_identity_clause(&self, _context: &mut Context, out: &mut String) {
        out.push_str("; SELECT SCOPE_IDENTITY() \"Id\"");
    }

    /// Emit an UPDATE statement. Parameters flagged as primary key are kept
    /// out of the SET list and combined (AND) into the WHERE clause. A
    /// parameter list with no non-key entries still renders its SET clause.
    fn write_update(&self, out: &mut String, table: &TableRef, params: &[Parameter]) {
        let mut context = Context::new(Fragment::SqlUpdate);
        out.reserve(64 + params.len() * 32);
        out.push_str("UPDATE ");
        self.write_table_ref(&mut context, out, table);
        out.push_str(" SET ");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            separated_by(
                out,
                params.iter().filter(|p| !p.primary_key),
                |out, p| {
                    self.write_identifier_quoted(&mut context, out, &p.name);
                    out.push_str(" = ");
                    out.push_str(p.placeholder());
                },
                ", ",
            );
        }
        let mut keys = params.iter().filter(|p| p.primary_key);
        if let Some(first) = keys.next() {
            let mut operands = vec![Expr::parameter(Operator::Equal, first)];
            operands.extend(keys.map(|p| Expr::parameter(Operator::Equal, p)));
            let condition = if operands.len() == 1 {
                operands.remove(0)
            } else {
                Expr::Compound {
                    op: Operator::And,
                    operands,
                    parentheses: false,
                }
            };
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            self.write_where_clause(&mut context, out, &condition);
        }
    }

    /// Emit a DELETE statement; without a condition the WHERE clause is
    /// omitted (full-table delete).
    fn write_delete(&self, out: &mut String, table: &TableRef, condition: Option<&Expr>) {
        let mut context = Context::new(Fragment::SqlDeleteFrom);
        out.reserve(32 + table.name.len());
        out.push_str("DELETE FROM ");
        self.write_table_ref(&mut context, out, table);
        if let Some(condition) = condition {
            let mut context = context.switch_fragment(Fragment::SqlDeleteFromWhere);
            self.write_where_clause(&mut context, out, condition);
        }
    }
}

/// Fallback generic SQL writer (SQL Server flavoured identity clause).
pub struct GenericSqlWriter;

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

/// SQLite dialect writer.
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_insert_identity_clause(&self, _context: &mut Context, out: &mut String) {
        out.push_str("; SELECT last_insert_rowid() \"Id\"");
    }
}

/// Process-wide writer singletons, one per dialect.
pub static GENERIC_SQL_WRITER: GenericSqlWriter = GenericSqlWriter;
pub static SQLITE_SQL_WRITER: SqliteSqlWriter = SqliteSqlWriter;
