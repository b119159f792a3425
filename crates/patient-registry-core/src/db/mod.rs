//! Database layer for the patient registry.

mod patients;
mod query;
mod schema;

#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use query::*;
pub use schema::*;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid value in column {column}: {value}")]
    InvalidValue { column: String, value: String },
}

impl DbError {
    /// Split engine constraint failures (NOT NULL, CHECK) out of generic SQLite errors.
    pub(crate) fn classify(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => DbError::Constraint(err.to_string()),
            _ => DbError::Sqlite(err),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Unicode case-fold available to every statement on the connection.
pub const CASEFOLD_FN: &str = "casefold";

/// Database connection wrapper.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = Self { conn };
        db.initialize()?;
        tracing::info!(path = %path.as_ref().display(), "opened patient database");
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        tracing::info!("opened in-memory patient database");
        Ok(db)
    }

    /// Register SQL functions and initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.create_scalar_function(
            CASEFOLD_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| crate::text::casefold(&t)))
            },
        )?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
    }

    #[test]
    fn test_open_file_twice_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO patients (first_name, last_name, date_of_birth, gender) VALUES ('A', 'B', '2000-01-01', 'male')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("patients.db");
        assert!(Database::open(&path).is_err());
    }

    #[test]
    fn test_classify_constraint() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .conn()
            .execute("INSERT INTO patients (first_name) VALUES ('A')", [])
            .unwrap_err();
        assert!(matches!(DbError::classify(err), DbError::Constraint(_)));
    }
}
