//! SQLite schema definition.

/// Complete database schema for the patient registry.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,         -- AUTOINCREMENT: ids are never reused
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,                  -- ISO date, YYYY-MM-DD
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
    email TEXT,
    phone TEXT,
    address TEXT,
    medical_notes TEXT,
    insurance_provider TEXT,
    insurance_id TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Default ordering and name search
CREATE INDEX IF NOT EXISTS idx_patient_name ON patients (last_name, first_name);
"#;
