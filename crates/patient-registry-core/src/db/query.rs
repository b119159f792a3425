//! Arbitrary statement execution for the query console.

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Batch, ToSql};

use super::{Database, DbError, DbResult};
use crate::models::SqlValue;

/// Column names and cells produced by one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Database {
    /// Execute a caller-supplied statement verbatim.
    ///
    /// `$n` and `?n` placeholders bind `params[n - 1]`; anonymous and named
    /// placeholders bind by position. Statements with no result columns
    /// (DML, DDL) return empty `columns` and `rows`. Only a single statement
    /// is accepted; trailing statements are rejected before anything runs.
    pub fn execute_query(&self, sql: &str, params: &[SqlValue]) -> DbResult<QueryRows> {
        let mut batch = Batch::new(&self.conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Err(DbError::InvalidValue {
                column: "sql".into(),
                value: "empty statement".into(),
            });
        };
        if batch.next()?.is_some() {
            return Err(DbError::InvalidValue {
                column: "sql".into(),
                value: "multiple statements are not supported".into(),
            });
        }

        for index in 1..=stmt.parameter_count() {
            let name = stmt.parameter_name(index).map(str::to_string);
            let slot = name
                .as_deref()
                .and_then(numbered_slot)
                .unwrap_or(index);
            let value = params.get(slot - 1).ok_or_else(|| DbError::InvalidValue {
                column: name.clone().unwrap_or_else(|| format!("?{}", index)),
                value: format!("no parameter supplied (got {})", params.len()),
            })?;
            stmt.raw_bind_parameter(index, value)?;
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(to_sql_value(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        tracing::debug!(columns = width, rows = rows.len(), "executed ad-hoc statement");
        Ok(QueryRows { columns, rows })
    }
}

/// `$3` / `?3` -> 3. Named placeholders (`:name`, `@name`) return `None`.
fn numbered_slot(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('$').or_else(|| name.strip_prefix('?'))?;
    digits.parse::<usize>().ok().filter(|n| *n > 0)
}

fn to_sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(i) => ToSqlOutput::from(*i),
            SqlValue::Real(f) => ToSqlOutput::from(*f),
            SqlValue::Text(s) => ToSqlOutput::from(s.as_str()),
            SqlValue::Blob(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}
