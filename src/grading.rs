use std::collections::HashSet;

use crate::columns::{ColumnRoles, ColumnRules};
use crate::models::{Cell, MarksTable, PercentRow, PercentTable, SheetTable, StudentReport, SubjectResult};

pub const GRACE_MIN: i64 = 1;
pub const GRACE_MAX: i64 = 15;
pub const GRACE_DEFAULT: i64 = 3;

pub const PASS_MARK: f64 = 40.0;
pub const GRACE_BAND_LOW: f64 = 37.0;
pub const GRACE_BAND_HIGH: f64 = 39.0;

const DEFAULT_MAX_MARKS: i64 = 100;

pub fn needs_grace(tee_percent: f64) -> bool {
    (GRACE_BAND_LOW..=GRACE_BAND_HIGH).contains(&tee_percent)
}

fn percent_of(score: f64, max_marks: i64) -> f64 {
    if max_marks == 0 {
        0.0
    } else {
        score / max_marks as f64 * 100.0
    }
}

/// Grades every distinct student against every TEE subject column. A
/// repeated identifier keeps its first row; rows with a blank identifier
/// are skipped. Reports come back sorted by identifier.
pub fn grade_students(
    table: &SheetTable,
    roles: &ColumnRoles,
    rules: &ColumnRules,
    marks: &MarksTable,
    grace: i64,
) -> Vec<StudentReport> {
    let Some(id_col) = roles.primary_id() else {
        return Vec::new();
    };

    let mut first_rows: Vec<(String, usize)> = Vec::new();
    let mut seen = HashSet::new();
    for row_idx in 0..table.rows.len() {
        let Some(cell) = table.cell(row_idx, id_col) else {
            continue;
        };
        if cell.is_blank() {
            continue;
        }
        let student_id = cell.display();
        if seen.insert(student_id.clone()) {
            first_rows.push((student_id, row_idx));
        }
    }
    first_rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut reports = Vec::with_capacity(first_rows.len());
    for (student_id, row_idx) in first_rows {
        let mut subjects = Vec::with_capacity(roles.tee_cols.len());
        let mut passed_all = true;
        let mut got_grace = false;

        for tee_col in &roles.tee_cols {
            let subject = rules.subject_of(tee_col).to_string();
            let max_marks = marks.get(tee_col).unwrap_or(DEFAULT_MAX_MARKS);

            let mut tee_score = table
                .cell(row_idx, tee_col)
                .map_or(f64::NAN, Cell::numeric_or_nan);
            let mut tee_percent = percent_of(tee_score, max_marks);

            let ica_col = rules.ica_column(&subject);
            let ica_score = if roles.ica_cols.contains(&ica_col) {
                table
                    .cell(row_idx, &ica_col)
                    .map_or(f64::NAN, Cell::numeric_or_nan)
            } else {
                0.0
            };

            let reported_final = match roles
                .final_cols
                .iter()
                .find(|column| column.contains(subject.as_str()))
            {
                Some(column) => table
                    .cell(row_idx, column)
                    .map_or(f64::NAN, Cell::numeric_or_nan),
                None => 0.0,
            };

            // Evaluated once, on the pre-grace percentage; never re-applied.
            let mut graced = false;
            if needs_grace(tee_percent) {
                tee_score += grace as f64;
                tee_percent = percent_of(tee_score, max_marks);
                graced = true;
                got_grace = true;
            }

            let final_score = match max_marks {
                100 => tee_score / 2.0 + ica_score,
                50 => tee_score + ica_score,
                _ => f64::NAN,
            };

            let passed = tee_percent >= PASS_MARK && final_score >= PASS_MARK;
            passed_all = passed_all && passed;

            subjects.push(SubjectResult {
                subject,
                tee_score,
                tee_percent,
                ica_score,
                reported_final,
                final_score,
                graced,
                passed,
            });
        }

        reports.push(StudentReport {
            student_id,
            got_grace,
            passed_all,
            subjects,
        });
    }

    reports
}

/// The per-row TEE percentage table. Only TEE columns with a resolvable,
/// non-zero maximum mark participate; rows are not grouped or deduplicated.
pub fn percent_table(table: &SheetTable, roles: &ColumnRoles, marks: &MarksTable) -> PercentTable {
    let tee_columns: Vec<String> = roles
        .tee_cols
        .iter()
        .filter(|column| marks.get(column).is_some_and(|max| max != 0))
        .cloned()
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for row_idx in 0..table.rows.len() {
        let ids = roles
            .id_cols
            .iter()
            .map(|column| {
                table
                    .cell(row_idx, column)
                    .map_or_else(String::new, Cell::display)
            })
            .collect();

        let mut scores = Vec::with_capacity(tee_columns.len());
        let mut percents = Vec::with_capacity(tee_columns.len());
        for column in &tee_columns {
            let score = table
                .cell(row_idx, column)
                .map_or(f64::NAN, Cell::numeric_or_nan);
            let max_marks = marks.get(column).unwrap_or(DEFAULT_MAX_MARKS);
            scores.push(score);
            percents.push(percent_of(score, max_marks));
        }
        rows.push(PercentRow {
            ids,
            scores,
            percents,
        });
    }

    PercentTable {
        id_columns: roles.id_cols.clone(),
        tee_columns,
        rows,
    }
}
