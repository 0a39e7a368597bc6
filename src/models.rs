use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// A sheet cell after the try-numeric conversion at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Blank,
}

impl Cell {
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Non-numeric cells come back as NaN so downstream comparisons
    /// evaluate false instead of raising.
    pub fn numeric_or_nan(&self) -> f64 {
        self.as_number().unwrap_or(f64::NAN)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Number(value) if value.fract() == 0.0 => format!("{}", *value as i64),
            Cell::Number(value) => value.to_string(),
            Cell::Text(text) => text.clone(),
            Cell::Blank => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MaxMarkEntry {
    pub subject: String,
    pub component: String,
    pub marks: i64,
}

/// Maximum marks keyed under both name orders, `component_subject` and
/// `subject_component`, so flattened column names resolve directly.
#[derive(Debug, Clone, Default)]
pub struct MarksTable {
    by_key: HashMap<String, i64>,
    entries: Vec<MaxMarkEntry>,
}

impl MarksTable {
    pub fn insert(&mut self, subject: &str, component: &str, marks: i64) {
        self.by_key.insert(format!("{component}_{subject}"), marks);
        self.by_key.insert(format!("{subject}_{component}"), marks);
        self.entries.push(MaxMarkEntry {
            subject: subject.to_string(),
            component: component.to_string(),
            marks,
        });
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.by_key.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MaxMarkEntry] {
        &self.entries
    }
}

/// The normalized student table: flattened column names plus cell rows.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn cell(&self, row_idx: usize, name: &str) -> Option<&Cell> {
        let column = self.column_index(name)?;
        self.rows.get(row_idx)?.get(column)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectResult {
    pub subject: String,
    pub tee_score: f64,
    pub tee_percent: f64,
    pub ica_score: f64,
    pub reported_final: f64,
    pub final_score: f64,
    pub graced: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student_id: String,
    pub got_grace: bool,
    pub passed_all: bool,
    pub subjects: Vec<SubjectResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PercentRow {
    pub ids: Vec<String>,
    pub scores: Vec<f64>,
    pub percents: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PercentTable {
    pub id_columns: Vec<String>,
    pub tee_columns: Vec<String>,
    pub rows: Vec<PercentRow>,
}

impl PercentTable {
    pub fn has_data(&self) -> bool {
        !self.tee_columns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HeaderNotFound {
    pub marker: String,
}

impl fmt::Display for HeaderNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no header row contains the identifier marker {:?}",
            self.marker
        )
    }
}

impl std::error::Error for HeaderNotFound {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_cells() {
        assert_eq!(Cell::parse(" 37 "), Cell::Number(37.0));
        assert_eq!(Cell::parse("absent"), Cell::Text("absent".to_string()));
        assert_eq!(Cell::parse("   "), Cell::Blank);
    }

    #[test]
    fn non_numeric_cells_become_nan() {
        assert!(Cell::parse("absent").numeric_or_nan().is_nan());
        assert!(Cell::Blank.numeric_or_nan().is_nan());
        assert_eq!(Cell::parse("42.5").numeric_or_nan(), 42.5);
    }

    #[test]
    fn integral_numbers_display_without_decimals() {
        assert_eq!(Cell::Number(2023.0).display(), "2023");
        assert_eq!(Cell::Number(42.5).display(), "42.5");
        assert_eq!(Cell::Text("S1".to_string()).display(), "S1");
    }

    #[test]
    fn marks_table_resolves_both_key_orders() {
        let mut marks = MarksTable::default();
        marks.insert("Math", "TEE", 100);
        assert_eq!(marks.get("TEE_Math"), Some(100));
        assert_eq!(marks.get("Math_TEE"), Some(100));
        assert_eq!(marks.get("TEE_Science"), None);
    }
}
