use std::fmt::Write;

use chrono::Utc;

use crate::columns::ColumnRoles;
use crate::models::{MarksTable, PercentTable, StudentReport};

pub const NO_TEE_DATA_NOTICE: &str = "ℹ️ No valid TEE data to display percentages.";

pub fn passed_with_grace(reports: &[StudentReport]) -> Vec<&StudentReport> {
    reports
        .iter()
        .filter(|report| report.got_grace && report.passed_all)
        .collect()
}

pub fn fmt_score(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn fmt_marked(value: f64, graced: bool) -> String {
    if graced {
        format!("**{}**", fmt_score(value))
    } else {
        fmt_score(value)
    }
}

fn push_table(out: &mut String, headers: &[String], rows: &[Vec<String>]) {
    let _ = writeln!(out, "| {} |", headers.join(" | "));
    let _ = writeln!(
        out,
        "|{}|",
        headers.iter().map(|_| " --- ").collect::<Vec<_>>().join("|")
    );
    for row in rows {
        let _ = writeln!(out, "| {} |", row.join(" | "));
    }
}

fn results_rows(
    reports: &[&StudentReport],
    bold_ids: bool,
    include_grace_flag: bool,
) -> Vec<Vec<String>> {
    reports
        .iter()
        .map(|report| {
            let mut row = Vec::with_capacity(2 + report.subjects.len() * 3);
            if bold_ids {
                row.push(format!("**{}**", report.student_id));
            } else {
                row.push(report.student_id.clone());
            }
            if include_grace_flag {
                row.push(report.got_grace.to_string());
            }
            for subject in &report.subjects {
                row.push(fmt_marked(subject.tee_percent, subject.graced));
                row.push(fmt_marked(subject.final_score, subject.graced));
                row.push(if subject.passed { "✅" } else { "❌" }.to_string());
            }
            row.push(if report.passed_all { "✅ Pass" } else { "❌ Fail" }.to_string());
            row
        })
        .collect()
}

fn results_headers(
    id_column: &str,
    reports: &[&StudentReport],
    include_grace_flag: bool,
) -> Vec<String> {
    let mut headers = vec![id_column.to_string()];
    if include_grace_flag {
        headers.push("Got_Grace".to_string());
    }
    if let Some(first) = reports.first() {
        for subject in &first.subjects {
            headers.push(format!("{}_TEE%", subject.subject));
            headers.push(format!("{}_Final", subject.subject));
            headers.push(format!("{}_Status", subject.subject));
        }
    }
    headers.push("Overall_Status".to_string());
    headers
}

pub fn build_report(
    grace: i64,
    roles: &ColumnRoles,
    marks: &MarksTable,
    percents: &PercentTable,
    reports: &[StudentReport],
) -> String {
    let mut output = String::new();
    let id_column = roles.primary_id().unwrap_or("Student");

    let _ = writeln!(output, "# 📘 Student Exam Failure & Simulation Report");
    let _ = writeln!(
        output,
        "Generated {} (grace marks: {})",
        Utc::now().date_naive(),
        grace
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## 📋 Total Marks for Each Subject Component");
    if marks.is_empty() {
        let _ = writeln!(output, "No total-marks row was found in the sheet.");
    } else {
        let headers = vec![
            "Subject".to_string(),
            "Component".to_string(),
            "Total Marks".to_string(),
        ];
        let rows: Vec<Vec<String>> = marks
            .entries()
            .iter()
            .map(|entry| {
                vec![
                    entry.subject.clone(),
                    entry.component.clone(),
                    entry.marks.to_string(),
                ]
            })
            .collect();
        push_table(&mut output, &headers, &rows);
    }

    if roles.tee_cols.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{NO_TEE_DATA_NOTICE}");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 📊 TEE% per Subject");
    if percents.has_data() {
        let mut headers = percents.id_columns.clone();
        for column in &percents.tee_columns {
            headers.push(column.clone());
            headers.push(format!("{column}_Percent"));
        }
        let rows: Vec<Vec<String>> = percents
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.ids.clone();
                for (score, percent) in row.scores.iter().zip(&row.percents) {
                    cells.push(fmt_score(*score));
                    cells.push(fmt_score(*percent));
                }
                cells
            })
            .collect();
        push_table(&mut output, &headers, &rows);
    } else {
        let _ = writeln!(output, "{NO_TEE_DATA_NOTICE}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 🎯 Exam Results (grace applied between {}% and {}% TEE)",
        crate::grading::GRACE_BAND_LOW, crate::grading::GRACE_BAND_HIGH);
    if reports.is_empty() {
        let _ = writeln!(output, "No student rows were found in the sheet.");
    } else {
        let all: Vec<&StudentReport> = reports.iter().collect();
        let headers = results_headers(id_column, &all, true);
        let rows = results_rows(&all, false, true);
        push_table(&mut output, &headers, &rows);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 📄 Passed Students (After Grace Marks)");
    let graced = passed_with_grace(reports);
    if graced.is_empty() {
        let _ = writeln!(output, "No students passed only because of grace marks.");
    } else {
        let headers = results_headers(id_column, &graced, false);
        let rows = results_rows(&graced, true, false);
        push_table(&mut output, &headers, &rows);
    }

    output
}

pub fn report_json(
    grace: i64,
    marks: &MarksTable,
    percents: &PercentTable,
    reports: &[StudentReport],
) -> anyhow::Result<String> {
    let document = serde_json::json!({
        "generated": Utc::now().date_naive().to_string(),
        "grace_marks": grace,
        "max_marks": marks.entries(),
        "tee_percentages": percents,
        "students": reports,
        "passed_with_grace": passed_with_grace(reports),
    });
    Ok(serde_json::to_string_pretty(&document)?)
}
