//! Registration form.
//!
//! `Idle -> Validating -> (invalid: Idle with errors | valid: Submitting)
//! -> (success: Idle with banner | failure: Idle with errors)`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use regex::Regex;
use tracing::{error, info};

use super::{ViewError, ViewResult};
use crate::models::{Gender, NewPatient};
use crate::registry::{PatientRegistry, RegistryResult};

pub const REQUIRED: &str = "Required";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_DATE: &str = "Invalid date";
pub const INVALID_GENDER: &str = "Invalid gender";
pub const SUCCESS_MESSAGE: &str = "Patient registered successfully!";
pub const SUBMIT_FAILED: &str = "Failed to register patient. Please try again.";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Inputs on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
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
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::DateOfBirth,
        FormField::Gender,
        FormField::Email,
        FormField::Phone,
        FormField::Address,
        FormField::MedicalNotes,
        FormField::InsuranceProvider,
        FormField::InsuranceId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormField::FirstName => "first_name",
            FormField::LastName => "last_name",
            FormField::DateOfBirth => "date_of_birth",
            FormField::Gender => "gender",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Address => "address",
            FormField::MedicalNotes => "medical_notes",
            FormField::InsuranceProvider => "insurance_provider",
            FormField::InsuranceId => "insurance_id",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            FormField::FirstName | FormField::LastName | FormField::DateOfBirth | FormField::Gender
        )
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown form field: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
}

/// Check raw form values and build the record to insert.
///
/// Returns every field error at once rather than stopping at the first.
pub fn validate(values: &BTreeMap<FormField, String>) -> Result<NewPatient, BTreeMap<FormField, String>> {
    let get = |field: FormField| values.get(&field).map(|v| v.trim()).unwrap_or("");
    let optional = |field: FormField| Some(get(field)).filter(|v| !v.is_empty()).map(String::from);

    let mut errors = BTreeMap::new();

    for field in FormField::ALL.into_iter().filter(FormField::is_required) {
        if get(field).is_empty() {
            errors.insert(field, REQUIRED.to_string());
        }
    }

    let dob = get(FormField::DateOfBirth);
    if !dob.is_empty() && NaiveDate::parse_from_str(dob, "%Y-%m-%d").is_err() {
        errors.insert(FormField::DateOfBirth, INVALID_DATE.to_string());
    }

    let gender = get(FormField::Gender);
    let parsed_gender = gender.parse::<Gender>();
    if !gender.is_empty() && parsed_gender.is_err() {
        errors.insert(FormField::Gender, INVALID_GENDER.to_string());
    }

    let email = get(FormField::Email);
    if !email.is_empty() && !EMAIL_SHAPE.is_match(email) {
        errors.insert(FormField::Email, INVALID_EMAIL.to_string());
    }

    match parsed_gender {
        Ok(gender) if errors.is_empty() => Ok(NewPatient {
            first_name: get(FormField::FirstName).to_string(),
            last_name: get(FormField::LastName).to_string(),
            date_of_birth: dob.to_string(),
            gender,
            email: optional(FormField::Email),
            phone: optional(FormField::Phone),
            address: optional(FormField::Address),
            medical_notes: optional(FormField::MedicalNotes),
            insurance_provider: optional(FormField::InsuranceProvider),
            insurance_id: optional(FormField::InsuranceId),
        }),
        _ => Err(errors),
    }
}

/// State of the registration screen.
#[derive(Debug, Clone)]
pub struct RegistrationView {
    values: BTreeMap<FormField, String>,
    errors: BTreeMap<FormField, String>,
    submit_error: Option<String>,
    state: FormState,
    banner_until: Option<Instant>,
    banner_duration: Duration,
}

impl RegistrationView {
    pub fn new(banner_duration: Duration) -> Self {
        Self {
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
            submit_error: None,
            state: FormState::Idle,
            banner_until: None,
            banner_duration,
        }
    }

    /// Edit a field; clears that field's error.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.values.insert(field, value.into());
        self.errors.remove(&field);
    }

    pub fn value(&self, field: FormField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Field-less failure from the last submission, if any.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn banner_visible(&self, now: Instant) -> bool {
        self.banner_until.is_some_and(|until| now < until)
    }

    /// Drop the success banner once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if !self.banner_visible(now) {
            self.banner_until = None;
        }
    }

    /// Validate and move to `Submitting`, handing back the record to insert.
    ///
    /// Invalid input returns to `Idle` with per-field errors and never
    /// produces a record.
    pub fn begin_submit(&mut self) -> ViewResult<NewPatient> {
        if self.is_submitting() {
            return Err(ViewError::Busy);
        }

        self.submit_error = None;
        match validate(&self.values) {
            Ok(patient) => {
                self.errors.clear();
                self.state = FormState::Submitting;
                Ok(patient)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(ViewError::Validation(errors))
            }
        }
    }

    /// Apply the registry's answer to a submission started with [`begin_submit`].
    ///
    /// [`begin_submit`]: RegistrationView::begin_submit
    pub fn finish_submit(&mut self, result: RegistryResult<i64>, now: Instant) -> ViewResult<i64> {
        self.state = FormState::Idle;
        match result {
            Ok(id) => {
                self.values.clear();
                self.banner_until = Some(now + self.banner_duration);
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "patient registration failed");
                self.submit_error = Some(SUBMIT_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Validate, insert, and update state in one step.
    pub fn submit(&mut self, registry: &PatientRegistry, now: Instant) -> ViewResult<i64> {
        let patient = self.begin_submit()?;
        let result = registry.insert(&patient);
        let id = self.finish_submit(result, now)?;
        info!(id, "registration form submitted");
        Ok(id)
    }
}
