//! Ad-hoc query values and results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single SQL value, used both for bound parameters and result cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// JSON representation for row mappings and export.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => Value::from(*i),
            SqlValue::Real(f) => Value::from(*f),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => f.write_str("null"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Real(r) => write!(f, "{}", r),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Result of an arbitrary statement.
///
/// Column names come from the prepared statement, not from any row, so every
/// row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Success {
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    Failure {
        error: String,
    },
}

impl QueryOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        QueryOutcome::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryOutcome::Failure { error } => Some(error),
            QueryOutcome::Success { .. } => None,
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            QueryOutcome::Success { columns, .. } => columns,
            QueryOutcome::Failure { .. } => &[],
        }
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        match self {
            QueryOutcome::Success { rows, .. } => rows,
            QueryOutcome::Failure { .. } => &[],
        }
    }

    /// True for failures and for successes with no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Rows as column-name-to-value mappings, in column order.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        let columns = self.columns();
        self.rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }
}
