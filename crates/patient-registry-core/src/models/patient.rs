//! Patient models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Administrative gender as captured at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Value stored in the `gender` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text is not one of `male`, `female`, `other`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid gender: {0}")]
pub struct InvalidGender(pub String);

impl FromStr for Gender {
    type Err = InvalidGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(InvalidGender(s.to_string())),
        }
    }
}

/// A patient record as persisted in the `patients` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Engine-assigned row ID, never reused
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// ISO date (`YYYY-MM-DD`)
    pub date_of_birth: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
    /// Insertion timestamp (UTC, RFC 3339), set by the engine
    pub created_at: String,
}

impl Patient {
    /// "Last, First" as shown in the patient list.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Read a column by field, for sorting and rendering.
    pub fn field(&self, field: PatientField) -> FieldValue<'_> {
        match field {
            PatientField::Id => FieldValue::Integer(self.id),
            PatientField::FirstName => FieldValue::Text(Some(&self.first_name)),
            PatientField::LastName => FieldValue::Text(Some(&self.last_name)),
            PatientField::DateOfBirth => FieldValue::Text(Some(&self.date_of_birth)),
            PatientField::Gender => FieldValue::Text(Some(self.gender.as_str())),
            PatientField::Email => FieldValue::Text(self.email.as_deref()),
            PatientField::Phone => FieldValue::Text(self.phone.as_deref()),
            PatientField::Address => FieldValue::Text(self.address.as_deref()),
            PatientField::MedicalNotes => FieldValue::Text(self.medical_notes.as_deref()),
            PatientField::InsuranceProvider => FieldValue::Text(self.insurance_provider.as_deref()),
            PatientField::InsuranceId => FieldValue::Text(self.insurance_id.as_deref()),
            PatientField::CreatedAt => FieldValue::Text(Some(&self.created_at)),
        }
    }
}

/// Borrowed view of a single patient column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Integer(i64),
    Text(Option<&'a str>),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Text(None))
    }
}

/// Columns of the `patients` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientField {
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    Gender,
    Email,
    Phone,
    Address,
    MedicalNotes,
    InsuranceProvider,
    InsuranceId,
    CreatedAt,
}

impl PatientField {
    pub const ALL: [PatientField; 12] = [
        PatientField::Id,
        PatientField::FirstName,
        PatientField::LastName,
        PatientField::DateOfBirth,
        PatientField::Gender,
        PatientField::Email,
        PatientField::Phone,
        PatientField::Address,
        PatientField::MedicalNotes,
        PatientField::InsuranceProvider,
        PatientField::InsuranceId,
        PatientField::CreatedAt,
    ];

    /// Column name in the `patients` table.
    pub fn column(&self) -> &'static str {
        match self {
            PatientField::Id => "id",
            PatientField::FirstName => "first_name",
            PatientField::LastName => "last_name",
            PatientField::DateOfBirth => "date_of_birth",
            PatientField::Gender => "gender",
            PatientField::Email => "email",
            PatientField::Phone => "phone",
            PatientField::Address => "address",
            PatientField::MedicalNotes => "medical_notes",
            PatientField::InsuranceProvider => "insurance_provider",
            PatientField::InsuranceId => "insurance_id",
            PatientField::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for PatientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for PatientField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientField::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| format!("unknown patient field: {}", s))
    }
}

/// Fields accepted at registration; `id` and `created_at` are assigned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
}

impl NewPatient {
    /// Create a record with required fields only.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: date_of_birth.into(),
            gender,
            email: None,
            phone: None,
            address: None,
            medical_notes: None,
            insurance_provider: None,
            insurance_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_medical_notes(mut self, notes: impl Into<String>) -> Self {
        self.medical_notes = Some(notes.into());
        self
    }

    pub fn with_insurance(mut self, provider: impl Into<String>, id: impl Into<String>) -> Self {
        self.insurance_provider = Some(provider.into());
        self.insurance_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" Female ".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("OTHER".parse::<Gender>().unwrap(), Gender::Other);
        assert!("".parse::<Gender>().is_err());
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_serializes_lowercase() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"female\"");
    }

    #[test]
    fn test_new_patient_defaults_optional_fields() {
        let patient = NewPatient::new("Ada", "Lovelace", "1815-12-10", Gender::Female);
        assert_eq!(patient.email, None);
        assert_eq!(patient.insurance_id, None);

        let patient = patient.with_insurance("Acme", "A-1");
        assert_eq!(patient.insurance_provider.as_deref(), Some("Acme"));
        assert_eq!(patient.insurance_id.as_deref(), Some("A-1"));
    }

    #[test]
    fn test_field_round_trip_by_column() {
        for field in PatientField::ALL {
            assert_eq!(field.column().parse::<PatientField>().unwrap(), field);
        }
        assert!("species".parse::<PatientField>().is_err());
    }
}
