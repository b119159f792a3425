//! Plain-text table rendering for terminal output.

use patient_registry_core::models::{FieldValue, Patient, PatientField, SqlValue};
use patient_registry_core::views::SortState;

/// Columns shown by `list`, in display order.
pub const LIST_COLUMNS: [PatientField; 8] = [
    PatientField::Id,
    PatientField::LastName,
    PatientField::FirstName,
    PatientField::DateOfBirth,
    PatientField::Gender,
    PatientField::Email,
    PatientField::Phone,
    PatientField::CreatedAt,
];

/// Render a grid with padded columns and a separator under the header.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}

/// Patient rows, with the sort arrow on the active column header.
pub fn patients(rows: &[Patient], sort: SortState) -> String {
    let headers: Vec<String> = LIST_COLUMNS
        .iter()
        .map(|field| {
            if *field == sort.key {
                format!("{} {}", field.column(), sort.order.arrow())
            } else {
                field.column().to_string()
            }
        })
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|p| {
            LIST_COLUMNS
                .iter()
                .map(|field| match p.field(*field) {
                    FieldValue::Integer(i) => i.to_string(),
                    FieldValue::Text(text) => text.unwrap_or("").to_string(),
                })
                .collect()
        })
        .collect();

    table(&headers, &cells)
}

/// Query results, one column per statement column.
pub fn query_rows(columns: &[String], rows: &[Vec<SqlValue>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    table(columns, &cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_pads_columns() {
        let out = table(
            &["id".into(), "name".into()],
            &[vec!["1".into(), "Lovelace".into()], vec!["10".into(), "Ho".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id | name");
        assert_eq!(lines[1], "-- | --------");
        assert_eq!(lines[2], "1  | Lovelace");
        assert_eq!(lines[3], "10 | Ho");
    }

    #[test]
    fn test_query_rows_nulls() {
        let out = query_rows(&["email".into()], &[vec![SqlValue::Null]]);
        assert!(out.lines().nth(2).unwrap().starts_with("null"));
    }
}
