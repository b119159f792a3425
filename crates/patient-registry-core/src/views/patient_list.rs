//! Sortable, searchable patient list.

use tracing::{error, warn};

use super::{sort_patients, SortState, ViewError, ViewResult};
use crate::export::{ExportFile, PATIENTS_EXPORT_FILE};
use crate::models::{Patient, PatientField};
use crate::registry::{PatientRegistry, RegistryResult};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this patient?";
pub const DELETE_FAILED: &str = "Failed to delete patient. Please try again.";
pub const NO_MATCHES: &str = "No matching patients found.";
pub const NO_PATIENTS: &str = "No patients available. Add new patients to get started.";

/// State of the patient list screen.
///
/// The fetched set is cached; sorting reorders the cache and never re-queries,
/// while search, clear and delete always go back to the registry.
#[derive(Debug, Clone, Default)]
pub struct PatientListView {
    patients: Vec<Patient>,
    search_term: String,
    sort: SortState,
    loading: bool,
    alert: Option<String>,
}

impl PatientListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every patient. On failure the previous set stays displayed.
    pub fn load(&mut self, registry: &PatientRegistry) -> ViewResult<()> {
        self.fetch(|| registry.list_all())
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Re-query by the current term; a blank term reloads everything.
    pub fn search(&mut self, registry: &PatientRegistry) -> ViewResult<()> {
        if self.search_term.trim().is_empty() {
            return self.load(registry);
        }
        let term = self.search_term.clone();
        self.fetch(|| registry.search_by_name(&term))
    }

    pub fn clear_search(&mut self, registry: &PatientRegistry) -> ViewResult<()> {
        self.search_term.clear();
        self.load(registry)
    }

    fn fetch<F>(&mut self, query: F) -> ViewResult<()>
    where
        F: FnOnce() -> RegistryResult<Vec<Patient>>,
    {
        self.begin_fetch()?;
        let result = query();
        self.finish_fetch(result)
    }

    /// Mark a fetch as in flight. Shells that run the registry call
    /// elsewhere pair this with [`finish_fetch`].
    ///
    /// [`finish_fetch`]: PatientListView::finish_fetch
    pub fn begin_fetch(&mut self) -> ViewResult<()> {
        if self.loading {
            return Err(ViewError::Busy);
        }
        self.loading = true;
        Ok(())
    }

    /// Apply a fetch result. On failure the previous set stays displayed.
    pub fn finish_fetch(&mut self, result: RegistryResult<Vec<Patient>>) -> ViewResult<()> {
        self.loading = false;
        match result {
            Ok(patients) => {
                self.patients = patients;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, term = %self.search_term, "Failed to fetch patients");
                Err(e.into())
            }
        }
    }

    pub fn toggle_sort(&mut self, key: PatientField) {
        self.sort.toggle(key);
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// The cached set in fetch order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// The cached set in the current display order.
    pub fn rows(&self) -> Vec<Patient> {
        sort_patients(&self.patients, self.sort)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Message for an empty list, depending on whether a search is active.
    pub fn empty_message(&self) -> &'static str {
        if self.search_term.is_empty() {
            NO_PATIENTS
        } else {
            NO_MATCHES
        }
    }

    /// Delete after confirmation, then reload the full set.
    ///
    /// `confirm` receives the cached patient (if present) and decides whether
    /// to go ahead. Returns `Ok(false)` when declined.
    pub fn delete<C>(&mut self, registry: &PatientRegistry, id: i64, confirm: C) -> ViewResult<bool>
    where
        C: FnOnce(Option<&Patient>) -> bool,
    {
        if self.loading {
            return Err(ViewError::Busy);
        }
        if !confirm(self.patients.iter().find(|p| p.id == id)) {
            return Ok(false);
        }

        if let Err(e) = registry.delete_by_id(id) {
            error!(id, error = %e, "Failed to delete patient");
            self.alert = Some(DELETE_FAILED.to_string());
            return Err(e.into());
        }

        self.load(registry)?;
        Ok(true)
    }

    /// User-visible alert from a failed delete.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// JSON of the cached set; `None` when there is nothing to export.
    pub fn export_json(&self) -> ViewResult<Option<ExportFile>> {
        if self.patients.is_empty() {
            return Ok(None);
        }
        Ok(Some(ExportFile::json(PATIENTS_EXPORT_FILE, &self.patients)?))
    }

    /// CSV of the cached set; `None` when there is nothing to export.
    pub fn export_csv(&self) -> ViewResult<Option<ExportFile>> {
        if self.patients.is_empty() {
            return Ok(None);
        }
        Ok(Some(ExportFile::patients_csv(&self.patients)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, NewPatient};
    use crate::views::SortOrder;

    fn seeded() -> PatientRegistry {
        let registry = PatientRegistry::in_memory();
        registry
            .insert(&NewPatient::new("Ada", "Lovelace", "1815-12-10", Gender::Female).with_email("ada@example.org"))
            .unwrap();
        registry
            .insert(&NewPatient::new("Grace", "Hopper", "1906-12-09", Gender::Female))
            .unwrap();
        registry
            .insert(&NewPatient::new("Alan", "Turing", "1912-06-23", Gender::Male).with_email("alan@example.org"))
            .unwrap();
        registry
    }

    fn last_names(rows: &[Patient]) -> Vec<&str> {
        rows.iter().map(|p| p.last_name.as_str()).collect()
    }

    #[test]
    fn test_load_uses_default_ordering() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        assert_eq!(last_names(&view.rows()), ["Hopper", "Lovelace", "Turing"]);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_sort_toggle_is_client_side() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        // Rows inserted behind the view's back do not appear until a reload.
        registry
            .insert(&NewPatient::new("Charles", "Babbage", "1791-12-26", Gender::Male))
            .unwrap();

        view.toggle_sort(PatientField::LastName);
        assert_eq!(view.sort_state().order, SortOrder::Desc);
        assert_eq!(last_names(&view.rows()), ["Turing", "Lovelace", "Hopper"]);
    }

    #[test]
    fn test_sort_nulls_placement() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        // ada@ < alan@ < (no email)
        view.toggle_sort(PatientField::Email);
        assert_eq!(last_names(&view.rows()), ["Lovelace", "Turing", "Hopper"]);

        view.toggle_sort(PatientField::Email);
        assert_eq!(last_names(&view.rows()), ["Hopper", "Turing", "Lovelace"]);
    }

    #[test]
    fn test_search_and_clear() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        view.set_search_term("ho");
        view.search(&registry).unwrap();
        assert_eq!(last_names(view.patients()), ["Hopper"]);

        view.set_search_term("nobody");
        view.search(&registry).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.empty_message(), NO_MATCHES);

        view.clear_search(&registry).unwrap();
        assert_eq!(view.patients().len(), 3);
        assert_eq!(view.search_term(), "");
    }

    #[test]
    fn test_blank_search_reloads_everything() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.set_search_term("   ");
        view.search(&registry).unwrap();
        assert_eq!(view.patients().len(), 3);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        let deleted = view.delete(&registry, 1, |_| false).unwrap();
        assert!(!deleted);
        assert_eq!(registry.count().unwrap(), 3);

        let mut seen = None;
        let deleted = view
            .delete(&registry, 1, |patient| {
                seen = patient.map(Patient::display_name);
                true
            })
            .unwrap();
        assert!(deleted);
        assert_eq!(seen.as_deref(), Some("Lovelace, Ada"));
        assert_eq!(last_names(view.patients()), ["Hopper", "Turing"]);
    }

    #[test]
    fn test_fetch_failure_keeps_previous_set() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        registry.run_query("DROP TABLE patients", &[]);
        assert!(view.load(&registry).is_err());
        assert_eq!(view.patients().len(), 3);
    }

    #[test]
    fn test_delete_failure_sets_alert() {
        let registry = seeded();
        let mut view = PatientListView::new();
        view.load(&registry).unwrap();

        registry.run_query("DROP TABLE patients", &[]);
        assert!(view.delete(&registry, 1, |_| true).is_err());
        assert_eq!(view.alert(), Some(DELETE_FAILED));

        view.dismiss_alert();
        assert_eq!(view.alert(), None);
    }

    #[test]
    fn test_busy_while_fetch_in_flight() {
        let registry = seeded();
        let mut view = PatientListView::new();

        view.begin_fetch().unwrap();
        assert!(view.is_loading());
        assert!(matches!(view.load(&registry), Err(ViewError::Busy)));
        assert!(matches!(view.delete(&registry, 1, |_| true), Err(ViewError::Busy)));
        assert_eq!(registry.count().unwrap(), 3);

        view.finish_fetch(registry.list_all()).unwrap();
        assert!(!view.is_loading());
        assert_eq!(view.patients().len(), 3);
        view.load(&registry).unwrap();
    }

    #[test]
    fn test_export() {
        let registry = seeded();
        let mut view = PatientListView::new();
        assert!(view.export_json().unwrap().is_none());
        assert_eq!(view.empty_message(), NO_PATIENTS);

        view.load(&registry).unwrap();
        let file = view.export_json().unwrap().unwrap();
        assert_eq!(file.file_name, PATIENTS_EXPORT_FILE);

        let parsed: Vec<Patient> = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(parsed, view.patients());

        let csv = view.export_csv().unwrap().unwrap();
        assert_eq!(csv.contents.lines().count(), 4);
    }
}
