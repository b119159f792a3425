//! View state for the three screens: registration, patient list, query console.
//!
//! Views are plain owned state machines. Each user action issues at most one
//! registry call; a view flagged busy rejects further actions until the call
//! completes.

mod patient_list;
mod query_console;
mod registration;
mod sort;

pub use patient_list::*;
pub use query_console::*;
pub use registration::*;
pub use sort::*;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::export::ExportError;
use crate::registry::RegistryError;

/// View-level errors.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(BTreeMap<FormField, String>),

    #[error("A request is already in flight")]
    Busy,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type ViewResult<T> = Result<T, ViewError>;
