//! Record access layer.
//!
//! [`PatientRegistry`] owns the single connection to the embedded engine. The
//! connection is opened on first use; concurrent first callers wait on the same
//! initialization, and a failed initialization is remembered so every later
//! call reports the same [`RegistryError::Connection`].

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::db::{Database, DbError, DbResult};
use crate::models::{NewPatient, Patient, QueryOutcome, SqlValue};

/// Access layer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The engine could not be initialized. Fatal for the registry's lifetime.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query error: {0}")]
    Query(String),
}

impl From<DbError> for RegistryError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(msg) => RegistryError::ConstraintViolation(msg),
            other => RegistryError::Query(engine_message(&other)),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Lazily connected patient store shared by all views.
pub struct PatientRegistry {
    config: RegistryConfig,
    conn: OnceLock<Result<Arc<Mutex<Database>>, String>>,
}

impl PatientRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            conn: OnceLock::new(),
        }
    }

    /// Registry backed by a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::new(RegistryConfig::default())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Open the connection and ensure the schema, once.
    pub fn connect(&self) -> RegistryResult<Arc<Mutex<Database>>> {
        self.conn
            .get_or_init(|| {
                let opened = match &self.config.database_path {
                    Some(path) => Database::open(path),
                    None => Database::open_in_memory(),
                };
                match opened {
                    Ok(db) => {
                        info!("patient registry connected");
                        Ok(Arc::new(Mutex::new(db)))
                    }
                    Err(e) => {
                        warn!(error = %e, "patient registry failed to connect");
                        Err(e.to_string())
                    }
                }
            })
            .clone()
            .map_err(RegistryError::Connection)
    }

    /// True once a connection attempt has succeeded.
    pub fn is_connected(&self) -> bool {
        matches!(self.conn.get(), Some(Ok(_)))
    }

    fn with_db<T>(&self, op: impl FnOnce(&Database) -> DbResult<T>) -> RegistryResult<T> {
        let conn = self.connect()?;
        let db = lock(&conn)?;
        op(&db).map_err(Into::into)
    }

    /// Insert a patient and return its new ID.
    pub fn insert(&self, patient: &NewPatient) -> RegistryResult<i64> {
        let id = self.with_db(|db| db.insert_patient(patient))?;
        info!(id, "registered patient");
        Ok(id)
    }

    /// Every patient, ordered by last name then first name.
    pub fn list_all(&self) -> RegistryResult<Vec<Patient>> {
        self.with_db(Database::list_patients)
    }

    /// Case-insensitive substring search on first or last name.
    pub fn search_by_name(&self, term: &str) -> RegistryResult<Vec<Patient>> {
        debug!(term, "searching patients");
        self.with_db(|db| db.search_patients(term))
    }

    pub fn get_by_id(&self, id: i64) -> RegistryResult<Option<Patient>> {
        self.with_db(|db| db.get_patient(id))
    }

    /// Delete by ID. Deleting a missing ID is not an error; returns rows removed.
    pub fn delete_by_id(&self, id: i64) -> RegistryResult<usize> {
        let removed = self.with_db(|db| db.delete_patient(id))?;
        info!(id, removed, "deleted patient");
        Ok(removed)
    }

    pub fn count(&self) -> RegistryResult<i64> {
        self.with_db(Database::count_patients)
    }

    /// Run an arbitrary statement. Failures of any kind, including a failed
    /// connection, come back as [`QueryOutcome::Failure`].
    pub fn run_query(&self, sql: &str, params: &[SqlValue]) -> QueryOutcome {
        let conn = match self.connect() {
            Ok(conn) => conn,
            Err(e) => return QueryOutcome::failure(e.to_string()),
        };
        let db = match lock(&conn) {
            Ok(db) => db,
            Err(e) => return QueryOutcome::failure(e.to_string()),
        };

        match db.execute_query(sql, params) {
            Ok(result) => QueryOutcome::Success {
                columns: result.columns,
                rows: result.rows,
            },
            Err(e) => {
                debug!(error = %e, "ad-hoc statement failed");
                QueryOutcome::failure(engine_message(&e))
            }
        }
    }
}

fn lock(conn: &Mutex<Database>) -> RegistryResult<MutexGuard<'_, Database>> {
    conn.lock()
        .map_err(|e| RegistryError::Query(format!("Lock poisoned: {}", e)))
}

/// The engine's own message, without our wrapper prefix.
fn engine_message(err: &DbError) -> String {
    match err {
        DbError::Sqlite(e) => e.to_string(),
        DbError::Constraint(msg) => msg.clone(),
        other => other.to_string(),
    }
}
