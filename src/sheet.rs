use std::path::Path;

use anyhow::Context;
use regex::Regex;

use crate::models::{Cell, HeaderNotFound, MarksTable, SheetTable};

#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub table: SheetTable,
    pub marks: MarksTable,
    pub skipped_marks_cells: usize,
}

pub fn load_csv(path: &Path) -> anyhow::Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Locates the two-row header block by the identifier marker, flattens it
/// into `{component}_{subject}` column names, and splits the remaining rows
/// into the student table plus the total-marks table.
pub fn parse_sheet(raw: &[Vec<String>], id_marker: &str) -> anyhow::Result<ParsedSheet> {
    let header_idx = raw
        .iter()
        .position(|row| row.iter().any(|cell| cell.contains(id_marker)))
        .ok_or(HeaderNotFound {
            marker: id_marker.to_string(),
        })?;

    let component_row = raw.get(header_idx + 1);
    let width = raw[header_idx]
        .len()
        .max(component_row.map_or(0, |row| row.len()));

    let subjects = forward_fill(&raw[header_idx], width);
    let components: Vec<String> = (0..width)
        .map(|i| {
            component_row
                .and_then(|row| row.get(i))
                .map(|cell| cell.trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    let columns: Vec<String> = subjects
        .iter()
        .zip(&components)
        .map(|(subject, component)| flat_name(subject, component))
        .collect();

    let data_start = (header_idx + 2).min(raw.len());
    let mut data: Vec<&Vec<String>> = raw[data_start..].iter().collect();

    let marks_pattern = Regex::new(r"(?i)\d+\s*marks").unwrap();
    let marks_row_idx = data
        .iter()
        .position(|row| row.iter().any(|cell| marks_pattern.is_match(cell)));

    let mut marks = MarksTable::default();
    let mut skipped_marks_cells = 0usize;
    if let Some(idx) = marks_row_idx {
        let marks_row = data.remove(idx);
        for (i, cell) in marks_row.iter().enumerate().take(width) {
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            match leading_int(value) {
                Some(mark) => marks.insert(&subjects[i], &components[i], mark),
                None => skipped_marks_cells += 1,
            }
        }
    }

    let rows: Vec<Vec<Cell>> = data
        .iter()
        .map(|row| {
            (0..width)
                .map(|i| Cell::parse(row.get(i).map(String::as_str).unwrap_or("")))
                .collect()
        })
        .collect();

    Ok(ParsedSheet {
        table: SheetTable { columns, rows },
        marks,
        skipped_marks_cells,
    })
}

fn forward_fill(row: &[String], width: usize) -> Vec<String> {
    let mut filled = Vec::with_capacity(width);
    let mut last = String::new();
    for i in 0..width {
        let value = row.get(i).map(|cell| cell.trim()).unwrap_or("");
        if !value.is_empty() {
            last = value.to_string();
        }
        filled.push(last.clone());
    }
    filled
}

fn flat_name(subject: &str, component: &str) -> String {
    if component.is_empty() {
        subject.to_string()
    } else {
        format!("{component}_{subject}")
    }
}

// "100 marks" parses as 100; anything without a leading integer token is
// skipped when building the marks table.
fn leading_int(value: &str) -> Option<i64> {
    value.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeaderNotFound;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn sample_grid() -> Vec<Vec<String>> {
        grid(&[
            &["Semester I Results", "", "", "", ""],
            &["Add.ID", "Math", "", "English", ""],
            &["", "TEE", "ICA", "TEE", "ICA"],
            &["Total", "100 marks", "50 marks", "100 marks", "50 marks"],
            &["S1", "37", "10", "80", "30"],
            &["S2", "80", "15", "90", "40"],
        ])
    }

    #[test]
    fn flattens_forward_filled_header() {
        let parsed = parse_sheet(&sample_grid(), "Add.ID").unwrap();
        assert_eq!(
            parsed.table.columns,
            vec!["Add.ID", "TEE_Math", "ICA_Math", "TEE_English", "ICA_English"]
        );
        assert_eq!(parsed.table.rows.len(), 2);
    }

    #[test]
    fn forward_fill_spans_multiple_blanks() {
        let raw = grid(&[
            &["Add.ID", "Math", "", "", ""],
            &["", "TEE", "ICA", "Final_Marks", "Remarks"],
            &["S1", "40", "20", "40", "ok"],
        ]);
        let parsed = parse_sheet(&raw, "Add.ID").unwrap();
        assert_eq!(
            parsed.table.columns,
            vec!["Add.ID", "TEE_Math", "ICA_Math", "Final_Marks_Math", "Remarks_Math"]
        );
    }

    #[test]
    fn rows_above_header_are_discarded() {
        let parsed = parse_sheet(&sample_grid(), "Add.ID").unwrap();
        let first = &parsed.table.rows[0];
        assert_eq!(first[0].display(), "S1");
    }

    #[test]
    fn marks_row_is_extracted_and_removed() {
        let parsed = parse_sheet(&sample_grid(), "Add.ID").unwrap();
        assert_eq!(parsed.marks.get("TEE_Math"), Some(100));
        assert_eq!(parsed.marks.get("ICA_English"), Some(50));
        assert_eq!(parsed.table.rows.len(), 2);
        // the label cell "Total" has no leading integer
        assert_eq!(parsed.skipped_marks_cells, 1);
    }

    #[test]
    fn missing_marks_row_leaves_table_empty() {
        let raw = grid(&[
            &["Add.ID", "Math", ""],
            &["", "TEE", "ICA"],
            &["S1", "37", "10"],
        ]);
        let parsed = parse_sheet(&raw, "Add.ID").unwrap();
        assert!(parsed.marks.is_empty());
        assert_eq!(parsed.table.rows.len(), 1);
    }

    #[test]
    fn missing_identifier_marker_is_fatal() {
        let raw = grid(&[&["Roll", "Math"], &["", "TEE"], &["S1", "37"]]);
        let err = parse_sheet(&raw, "Add.ID").unwrap_err();
        assert!(err.downcast_ref::<HeaderNotFound>().is_some());
    }

    #[test]
    fn marks_cells_parse_leading_integer_only() {
        assert_eq!(leading_int("100 marks"), Some(100));
        assert_eq!(leading_int("50"), Some(50));
        assert_eq!(leading_int("marks"), None);
        assert_eq!(leading_int("100.5 marks"), None);
    }

    #[test]
    fn header_as_last_row_yields_empty_table() {
        let raw = grid(&[&["Semester"], &["Add.ID", "Math"]]);
        let parsed = parse_sheet(&raw, "Add.ID").unwrap();
        assert!(parsed.table.rows.is_empty());
        assert_eq!(parsed.table.columns, vec!["Add.ID", "Math"]);
    }
}
