//! Client-side ordering of the cached patient set.

use std::cmp::Ordering;

use crate::models::{FieldValue, Patient, PatientField};
use crate::text::collation_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: PatientField,
    pub order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: PatientField::LastName,
            order: SortOrder::Asc,
        }
    }
}

impl SortState {
    /// Same key flips the order; a new key starts ascending.
    pub fn toggle(&mut self, key: PatientField) {
        if key == self.key {
            self.order = self.order.toggled();
        } else {
            self.key = key;
            self.order = SortOrder::Asc;
        }
    }
}

/// Locale-style text ordering: letters compare without case or accents
/// first ("Émile" sits between "Eaton" and "Zola"), then by lowercase text,
/// then by the raw text so distinct strings never compare equal.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Ascending comparison with nulls last.
pub fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Text(None), FieldValue::Text(None)) => Ordering::Equal,
        (FieldValue::Text(None), _) => Ordering::Greater,
        (_, FieldValue::Text(None)) => Ordering::Less,
        (FieldValue::Text(Some(a)), FieldValue::Text(Some(b))) => compare_text(a, b),
        (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(&b),
        (FieldValue::Integer(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Integer(_)) => Ordering::Greater,
    }
}

/// Sorted copy of `patients`. Descending is the exact reverse of ascending,
/// so nulls come first when descending.
pub fn sort_patients(patients: &[Patient], sort: SortState) -> Vec<Patient> {
    let mut sorted = patients.to_vec();
    sorted.sort_by(|a, b| compare_values(a.field(sort.key), b.field(sort.key)));
    if sort.order == SortOrder::Desc {
        sorted.reverse();
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut sort = SortState::default();
        assert_eq!(sort.key, PatientField::LastName);
        assert_eq!(sort.order, SortOrder::Asc);

        sort.toggle(PatientField::LastName);
        assert_eq!(sort.order, SortOrder::Desc);

        sort.toggle(PatientField::Email);
        assert_eq!(sort.key, PatientField::Email);
        assert_eq!(sort.order, SortOrder::Asc);
    }

    #[test]
    fn test_nulls_last_ascending() {
        assert_eq!(
            compare_values(FieldValue::Text(None), FieldValue::Text(Some("a"))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(FieldValue::Text(Some("a")), FieldValue::Text(None)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldValue::Text(None), FieldValue::Text(None)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_text_is_case_insensitive_first() {
        assert_eq!(compare_text("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_text("Zed", "abe"), Ordering::Greater);
        assert_ne!(compare_text("ada", "Ada"), Ordering::Equal);
    }

    #[test]
    fn test_compare_text_accented_letters() {
        assert_eq!(compare_text("Émile", "Zola"), Ordering::Less);
        assert_eq!(compare_text("Eaton", "Émile"), Ordering::Less);
        assert_eq!(compare_text("Ñúñez", "Nyman"), Ordering::Less);
        assert_ne!(compare_text("Emile", "Émile"), Ordering::Equal);
    }

    #[test]
    fn test_sort_accented_last_names() {
        let make = |id: i64, last: &str| Patient {
            id,
            first_name: "X".into(),
            last_name: last.into(),
            date_of_birth: "1990-01-01".into(),
            gender: crate::models::Gender::Other,
            email: None,
            phone: None,
            address: None,
            medical_notes: None,
            insurance_provider: None,
            insurance_id: None,
            created_at: "2024-01-01T00:00:00.000Z".into(),
        };
        let patients = vec![make(1, "Zola"), make(2, "Émile"), make(3, "Eaton")];

        let sorted = sort_patients(&patients, SortState::default());
        let names: Vec<&str> = sorted.iter().map(|p| p.last_name.as_str()).collect();
        assert_eq!(names, ["Eaton", "Émile", "Zola"]);
    }
}
