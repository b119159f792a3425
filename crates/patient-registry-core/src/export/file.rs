//! Downloadable result files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ExportError, ExportResult};
use crate::models::{Patient, PatientField};

/// File name offered by the patient list export.
pub const PATIENTS_EXPORT_FILE: &str = "patients_export.json";
/// CSV variant of the patient list export.
pub const PATIENTS_CSV_EXPORT_FILE: &str = "patients_export.csv";
/// File name offered by the query console export.
pub const QUERY_EXPORT_FILE: &str = "patient_query_results.json";

/// An in-memory file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

impl ExportFile {
    /// Serialize `data` as indented JSON.
    pub fn json<T: Serialize + ?Sized>(file_name: &str, data: &T) -> ExportResult<Self> {
        Ok(Self {
            file_name: file_name.to_string(),
            contents: serde_json::to_string_pretty(data)?,
        })
    }

    /// Patient rows as CSV, one column per table column.
    pub fn patients_csv(patients: &[Patient]) -> ExportResult<Self> {
        if patients.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut csv = String::new();

        // Header
        let header: Vec<&str> = PatientField::ALL.iter().map(PatientField::column).collect();
        csv.push_str(&header.join(","));
        csv.push('\n');

        // Lines
        for patient in patients {
            let cells: Vec<String> = PatientField::ALL
                .iter()
                .map(|field| match patient.field(*field) {
                    crate::models::FieldValue::Integer(i) => i.to_string(),
                    crate::models::FieldValue::Text(text) => escape_csv(text.unwrap_or("")),
                })
                .collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }

        Ok(Self {
            file_name: PATIENTS_CSV_EXPORT_FILE.to_string(),
            contents: csv,
        })
    }

    /// Write into `dir`, creating it if needed. Returns the full path.
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents)?;
        tracing::info!(path = %path.display(), bytes = self.contents.len(), "wrote export");
        Ok(path)
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
