//! JSON/CSV export and clipboard copy of result sets.

mod clipboard;
mod file;

pub use clipboard::*;
pub use file::*;

use thiserror::Error;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to export")]
    Empty,
}

pub type ExportResult<T> = Result<T, ExportError>;
