//! Ad-hoc query console.

use std::time::{Duration, Instant};

use super::{ViewError, ViewResult};
use crate::export::{Clipboard, ExportFile, QUERY_EXPORT_FILE};
use crate::models::{QueryOutcome, SqlValue};
use crate::registry::PatientRegistry;

pub const DEFAULT_QUERY: &str = "SELECT * FROM patients";
pub const NO_DATA: &str = "No data";
pub const COPIED: &str = "Copied!";

/// What the console should show for its current outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleDisplay<'a> {
    /// Nothing has been run yet
    Nothing,
    Error(&'a str),
    NoData,
    Table {
        columns: &'a [String],
        rows: &'a [Vec<SqlValue>],
    },
}

/// State of the query console screen.
#[derive(Debug, Clone)]
pub struct QueryConsoleView {
    sql: String,
    params: Vec<SqlValue>,
    outcome: Option<QueryOutcome>,
    executing: bool,
    copied_until: Option<Instant>,
    copy_ack: Duration,
}

impl QueryConsoleView {
    pub fn new(copy_ack: Duration) -> Self {
        Self {
            sql: DEFAULT_QUERY.to_string(),
            params: Vec::new(),
            outcome: None,
            executing: false,
            copied_until: None,
            copy_ack,
        }
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn set_params(&mut self, params: Vec<SqlValue>) {
        self.params = params;
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Run the current statement verbatim. Blank statements are skipped and
    /// return `Ok(false)`.
    pub fn execute(&mut self, registry: &PatientRegistry) -> ViewResult<bool> {
        if !self.begin_execute()? {
            return Ok(false);
        }
        let outcome = registry.run_query(&self.sql, &self.params);
        self.finish_execute(outcome);
        Ok(true)
    }

    /// Mark the current statement as running. Returns `Ok(false)` without
    /// changing state when the statement is blank.
    pub fn begin_execute(&mut self) -> ViewResult<bool> {
        if self.executing {
            return Err(ViewError::Busy);
        }
        if self.sql.trim().is_empty() {
            return Ok(false);
        }
        self.executing = true;
        Ok(true)
    }

    /// Store the outcome of a statement started with [`begin_execute`].
    ///
    /// [`begin_execute`]: QueryConsoleView::begin_execute
    pub fn finish_execute(&mut self, outcome: QueryOutcome) {
        self.executing = false;
        if let Some(error) = outcome.error() {
            tracing::debug!(error, "console statement failed");
        }
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&QueryOutcome> {
        self.outcome.as_ref()
    }

    pub fn display(&self) -> ConsoleDisplay<'_> {
        match &self.outcome {
            None => ConsoleDisplay::Nothing,
            Some(QueryOutcome::Failure { error }) => ConsoleDisplay::Error(error),
            Some(QueryOutcome::Success { rows, .. }) if rows.is_empty() => ConsoleDisplay::NoData,
            Some(QueryOutcome::Success { columns, rows }) => ConsoleDisplay::Table { columns, rows },
        }
    }

    /// Copy and download are offered only for non-empty successful results.
    pub fn has_results(&self) -> bool {
        self.outcome
            .as_ref()
            .is_some_and(|o| o.is_success() && !o.is_empty())
    }

    fn results_json(&self) -> ViewResult<Option<ExportFile>> {
        match &self.outcome {
            Some(outcome) if self.has_results() => {
                Ok(Some(ExportFile::json(QUERY_EXPORT_FILE, &outcome.records())?))
            }
            _ => Ok(None),
        }
    }

    /// Results as a downloadable JSON file.
    pub fn export_json(&self) -> ViewResult<Option<ExportFile>> {
        self.results_json()
    }

    /// Copy the results' JSON to `clipboard` and start the acknowledgement timer.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> ViewResult<bool> {
        let Some(file) = self.results_json()? else {
            return Ok(false);
        };
        clipboard.write_text(&file.contents)?;
        self.copied_until = Some(now + self.copy_ack);
        Ok(true)
    }

    pub fn copied_visible(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }
}
