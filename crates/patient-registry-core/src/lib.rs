//! Patient Registry Core Library
//!
//! Local-first patient registration backed by an embedded SQLite engine.
//!
//! # Architecture
//!
//! ```text
//!   Registration form      Patient list        Query console
//!   (validate, submit)   (sort, search, del)   (run, export, copy)
//!           │                    │                    │
//!           └────────────────────┼────────────────────┘
//!                                ▼
//!                         PatientRegistry
//!               (lazy single connection, typed ops)
//!                                │
//!                                ▼
//!                      SQLite `patients` table
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite schema and statements
//! - [`models`]: Domain types (Patient, NewPatient, QueryOutcome, etc.)
//! - [`registry`]: Record access layer
//! - [`views`]: Registration, list and console state machines
//! - [`export`]: JSON/CSV export and clipboard copy
//! - [`config`]: Environment-driven configuration
//! - [`text`]: Unicode case folding and collation keys

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod registry;
pub mod text;
pub mod views;

// Re-export commonly used types
pub use config::RegistryConfig;
pub use db::Database;
pub use models::{Gender, NewPatient, Patient, PatientField, QueryOutcome, SqlValue};
pub use registry::{PatientRegistry, RegistryError, RegistryResult};
pub use views::{PatientListView, QueryConsoleView, RegistrationView};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PatientRegistryError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<RegistryError> for PatientRegistryError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Connection(msg) => PatientRegistryError::ConnectionError(msg),
            RegistryError::ConstraintViolation(msg) => PatientRegistryError::ConstraintViolation(msg),
            RegistryError::Query(msg) => PatientRegistryError::QueryError(msg),
        }
    }
}

impl From<serde_json::Error> for PatientRegistryError {
    fn from(e: serde_json::Error) -> Self {
        PatientRegistryError::SerializationError(e.to_string())
    }
}

impl From<export::ExportError> for PatientRegistryError {
    fn from(e: export::ExportError) -> Self {
        PatientRegistryError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a registry at the given path.
#[uniffi::export]
pub fn open_registry(path: String) -> Result<Arc<PatientRegistryCore>, PatientRegistryError> {
    let registry = PatientRegistry::new(RegistryConfig::default().with_database_path(path));
    registry.connect()?;
    Ok(Arc::new(PatientRegistryCore { registry }))
}

/// Create an in-memory registry (for testing).
#[uniffi::export]
pub fn open_registry_in_memory() -> Result<Arc<PatientRegistryCore>, PatientRegistryError> {
    let registry = PatientRegistry::in_memory();
    registry.connect()?;
    Ok(Arc::new(PatientRegistryCore { registry }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe registry wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PatientRegistryCore {
    registry: PatientRegistry,
}

#[uniffi::export]
impl PatientRegistryCore {
    /// Register a new patient; returns the assigned ID.
    pub fn register_patient(&self, patient: FfiNewPatient) -> Result<i64, PatientRegistryError> {
        let patient = NewPatient::try_from(patient)?;
        Ok(self.registry.insert(&patient)?)
    }

    /// All patients ordered by last name, first name.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, PatientRegistryError> {
        let patients = self.registry.list_all()?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive name search.
    pub fn search_patients(&self, term: String) -> Result<Vec<FfiPatient>, PatientRegistryError> {
        let patients = self.registry.search_by_name(&term)?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, PatientRegistryError> {
        let patient = self.registry.get_by_id(id)?;
        Ok(patient.map(Into::into))
    }

    /// Delete a patient; deleting a missing ID returns 0.
    pub fn delete_patient(&self, id: i64) -> Result<u64, PatientRegistryError> {
        Ok(self.registry.delete_by_id(id)? as u64)
    }

    /// Number of registered patients.
    pub fn count_patients(&self) -> Result<i64, PatientRegistryError> {
        Ok(self.registry.count()?)
    }

    /// Run an arbitrary statement. `params_json` is a JSON array of values.
    pub fn run_query(&self, sql: String, params_json: String) -> FfiQueryResult {
        let params: Vec<SqlValue> = if params_json.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(&params_json) {
                Ok(params) => params,
                Err(e) => return FfiQueryResult::from(QueryOutcome::failure(e.to_string())),
            }
        };
        self.registry.run_query(&sql, &params).into()
    }

    /// Export all patients as indented JSON.
    pub fn export_patients_json(&self) -> Result<String, PatientRegistryError> {
        let patients = self.registry.list_all()?;
        let file = export::ExportFile::json(export::PATIENTS_EXPORT_FILE, &patients)?;
        Ok(file.contents)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe registration input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
}

impl TryFrom<FfiNewPatient> for NewPatient {
    type Error = PatientRegistryError;

    fn try_from(p: FfiNewPatient) -> Result<Self, Self::Error> {
        let gender = p
            .gender
            .parse::<Gender>()
            .map_err(|e| PatientRegistryError::InvalidInput(e.to_string()))?;
        Ok(NewPatient {
            first_name: p.first_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            gender,
            email: p.email,
            phone: p.phone,
            address: p.address,
            medical_notes: p.medical_notes,
            insurance_provider: p.insurance_provider,
            insurance_id: p.insurance_id,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            gender: p.gender.to_string(),
            email: p.email,
            phone: p.phone,
            address: p.address,
            medical_notes: p.medical_notes,
            insurance_provider: p.insurance_provider,
            insurance_id: p.insurance_id,
            created_at: p.created_at,
        }
    }
}

/// FFI-safe query result. `rows_json` holds the rows as a JSON array of objects.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueryResult {
    pub success: bool,
    pub columns: Vec<String>,
    pub rows_json: String,
    pub error: Option<String>,
}

impl From<QueryOutcome> for FfiQueryResult {
    fn from(outcome: QueryOutcome) -> Self {
        let rows_json = serde_json::to_string(&outcome.records()).unwrap_or_else(|_| "[]".into());
        Self {
            success: outcome.is_success(),
            columns: outcome.columns().to_vec(),
            rows_json,
            error: outcome.error().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_ada() -> FfiNewPatient {
        FfiNewPatient {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: "1815-12-10".into(),
            gender: "female".into(),
            email: None,
            phone: None,
            address: None,
            medical_notes: None,
            insurance_provider: None,
            insurance_id: None,
        }
    }

    #[test]
    fn test_ffi_round_trip() {
        let core = open_registry_in_memory().unwrap();
        let id = core.register_patient(ffi_ada()).unwrap();

        let patients = core.list_patients().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, id);
        assert_eq!(patients[0].gender, "female");

        assert_eq!(core.search_patients("lovel".into()).unwrap().len(), 1);
        assert!(core.get_patient(id).unwrap().is_some());
        assert_eq!(core.count_patients().unwrap(), 1);
        assert_eq!(core.delete_patient(id).unwrap(), 1);
        assert_eq!(core.delete_patient(id).unwrap(), 0);
    }

    #[test]
    fn test_ffi_invalid_gender() {
        let core = open_registry_in_memory().unwrap();
        let mut patient = ffi_ada();
        patient.gender = "unknown".into();
        assert!(matches!(
            core.register_patient(patient),
            Err(PatientRegistryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ffi_run_query() {
        let core = open_registry_in_memory().unwrap();
        core.register_patient(ffi_ada()).unwrap();

        let result = core.run_query("SELECT id, last_name FROM patients WHERE id = $1".into(), "[1]".into());
        assert!(result.success);
        assert_eq!(result.columns, ["id", "last_name"]);
        assert_eq!(result.rows_json, r#"[{"id":1,"last_name":"Lovelace"}]"#);

        let result = core.run_query("SELECT".into(), String::new());
        assert!(!result.success);
        assert!(result.error.is_some());

        let result = core.run_query("SELECT 1".into(), "not json".into());
        assert!(!result.success);
    }

    #[test]
    fn test_ffi_export() {
        let core = open_registry_in_memory().unwrap();
        core.register_patient(ffi_ada()).unwrap();
        let json = core.export_patients_json().unwrap();
        assert!(json.contains("\"first_name\": \"Ada\""));
    }

    #[test]
    fn test_open_registry_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("patients.db");
        let result = open_registry(path.to_string_lossy().into_owned());
        assert!(matches!(result, Err(PatientRegistryError::ConnectionError(_))));
    }
}
