//! Patient database operations.

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, CASEFOLD_FN};
use crate::models::{Gender, NewPatient, Patient};
use crate::text::casefold;

const PATIENT_COLUMNS: &str = r#"
    id, first_name, last_name, date_of_birth, gender, email, phone,
    address, medical_notes, insurance_provider, insurance_id, created_at
"#;

impl Database {
    /// Insert a new patient, returning the assigned ID.
    ///
    /// Blank text is bound as NULL, so missing required fields are rejected by
    /// the NOT NULL constraints and absent optional fields are never stored as `''`.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO patients (
                    first_name, last_name, date_of_birth, gender, email, phone,
                    address, medical_notes, insurance_provider, insurance_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    non_blank(Some(&patient.first_name)),
                    non_blank(Some(&patient.last_name)),
                    non_blank(Some(&patient.date_of_birth)),
                    patient.gender.as_str(),
                    non_blank(patient.email.as_ref()),
                    non_blank(patient.phone.as_ref()),
                    non_blank(patient.address.as_ref()),
                    non_blank(patient.medical_notes.as_ref()),
                    non_blank(patient.insurance_provider.as_ref()),
                    non_blank(patient.insurance_id.as_ref()),
                ],
            )
            .map_err(DbError::classify)?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, "inserted patient");
        Ok(id)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                row_to_patient,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients ordered by last name, then first name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY last_name, first_name, id",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([], row_to_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search patients by case-insensitive substring of first or last name.
    ///
    /// Case folding is Unicode-aware ("MÜLL" finds "Müller"). The term is
    /// matched literally, so `%` and `_` are not wildcards. An empty term
    /// matches every patient.
    pub fn search_patients(&self, term: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {cols}
            FROM patients
            WHERE instr({fold}(first_name), ?1) > 0 OR instr({fold}(last_name), ?1) > 0
            ORDER BY last_name, first_name, id
            "#,
            cols = PATIENT_COLUMNS,
            fold = CASEFOLD_FN,
        ))?;

        let rows = stmt.query_map([casefold(term)], row_to_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient. Returns the number of rows removed (0 or 1).
    pub fn delete_patient(&self, id: i64) -> DbResult<usize> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected)
    }

    /// Count all patients.
    pub fn count_patients(&self) -> DbResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let gender: String = row.get(4)?;
    let gender = gender
        .parse::<Gender>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender,
        email: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        medical_notes: row.get(8)?,
        insurance_provider: row.get(9)?,
        insurance_id: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn ada() -> NewPatient {
        NewPatient::new("Ada", "Lovelace", "1815-12-10", Gender::Female)
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let patient = ada()
            .with_email("ada@example.org")
            .with_medical_notes("Analytical engine");
        let id = db.insert_patient(&patient).unwrap();
        assert_eq!(id, 1);

        let retrieved = db.get_patient(id).unwrap().unwrap();
        assert_eq!(retrieved.first_name, "Ada");
        assert_eq!(retrieved.last_name, "Lovelace");
        assert_eq!(retrieved.gender, Gender::Female);
        assert_eq!(retrieved.email, Some("ada@example.org".into()));
        assert_eq!(retrieved.medical_notes, Some("Analytical engine".into()));
        assert_eq!(retrieved.phone, None);
    }

    #[test]
    fn test_blank_optional_stored_as_null() {
        let db = setup_db();

        let id = db.insert_patient(&ada().with_phone("   ")).unwrap();

        let is_null: bool = db
            .conn()
            .query_row("SELECT phone IS NULL FROM patients WHERE id = ?", [id], |row| row.get(0))
            .unwrap();
        assert!(is_null);
    }

    #[test]
    fn test_blank_required_is_constraint_violation() {
        let db = setup_db();

        let patient = NewPatient::new("", "Lovelace", "1815-12-10", Gender::Female);
        let result = db.insert_patient(&patient);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_list_ordered_by_last_then_first() {
        let db = setup_db();

        db.insert_patient(&NewPatient::new("Grace", "Hopper", "1906-12-09", Gender::Female)).unwrap();
        db.insert_patient(&NewPatient::new("Charles", "Babbage", "1791-12-26", Gender::Male)).unwrap();
        db.insert_patient(&NewPatient::new("Benjamin", "Babbage", "1815-01-01", Gender::Male)).unwrap();

        let names: Vec<String> = db
            .list_patients()
            .unwrap()
            .iter()
            .map(Patient::display_name)
            .collect();
        assert_eq!(names, ["Babbage, Benjamin", "Babbage, Charles", "Hopper, Grace"]);
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        db.insert_patient(&ada()).unwrap();
        db.insert_patient(&NewPatient::new("Grace", "Hopper", "1906-12-09", Gender::Female)).unwrap();
        db.insert_patient(&NewPatient::new("Lovell", "Smith", "1950-03-03", Gender::Male)).unwrap();

        let results = db.search_patients("LOVEL").unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.last_name == "Lovelace"));
        assert!(results.iter().any(|p| p.first_name == "Lovell"));

        assert_eq!(db.search_patients("").unwrap().len(), 3);
        assert!(db.search_patients("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let db = setup_db();

        db.insert_patient(&ada()).unwrap();
        db.insert_patient(&NewPatient::new("Al_ex", "O%Neil", "1990-01-01", Gender::Other)).unwrap();

        assert_eq!(db.search_patients("%").unwrap().len(), 1);
        assert_eq!(db.search_patients("_").unwrap().len(), 1);
        assert_eq!(db.search_patients("l_e").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = setup_db();

        let id = db.insert_patient(&ada()).unwrap();
        assert_eq!(db.delete_patient(id).unwrap(), 1);
        assert_eq!(db.delete_patient(id).unwrap(), 0);
        assert!(db.get_patient(id).unwrap().is_none());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let db = setup_db();

        let first = db.insert_patient(&ada()).unwrap();
        db.delete_patient(first).unwrap();
        let second = db.insert_patient(&ada()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_count_patients() {
        let db = setup_db();
        assert_eq!(db.count_patients().unwrap(), 0);
        db.insert_patient(&ada()).unwrap();
        assert_eq!(db.count_patients().unwrap(), 1);
    }

    #[test]
    fn test_search_non_ascii_names() {
        let db = setup_db();

        db.insert_patient(&ada()).unwrap();
        db.insert_patient(&NewPatient::new("Élodie", "Müller", "1988-04-02", Gender::Female)).unwrap();

        let results = db.search_patients("élo").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].last_name, "Müller");

        assert_eq!(db.search_patients("MÜLL").unwrap().len(), 1);
        assert_eq!(db.search_patients("ÉLODIE").unwrap().len(), 1);
        // Decomposed input folds to the same text
        assert_eq!(db.search_patients("e\u{301}lo").unwrap().len(), 1);
        // Accents are significant
        assert!(db.search_patients("muller").unwrap().is_empty());
    }

    #[test]
    fn test_casefold_function_handles_null() {
        let db = setup_db();
        let folded: Option<String> = db
            .conn()
            .query_row("SELECT casefold(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, None);
    }
}
