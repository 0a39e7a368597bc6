use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod columns;
mod grading;
mod models;
mod report;
mod sheet;

use columns::{ColumnRoles, ColumnRules};
use sheet::ParsedSheet;

#[derive(Parser)]
#[command(name = "exam-grace-report")]
#[command(about = "Exam-result grace marks and pass/fail reporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the maximum marks resolved for each subject component
    Marks {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show TEE percentages for every row of the sheet
    Percent {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Grade all students and print a pass/fail summary
    Score {
        #[arg(long)]
        csv: PathBuf,
        #[arg(
            long,
            default_value_t = grading::GRACE_DEFAULT,
            value_parser = clap::value_parser!(i64).range(grading::GRACE_MIN..=grading::GRACE_MAX)
        )]
        grace: i64,
    },
    /// Write the full report as markdown (or JSON with --json)
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(
            long,
            default_value_t = grading::GRACE_DEFAULT,
            value_parser = clap::value_parser!(i64).range(grading::GRACE_MIN..=grading::GRACE_MAX)
        )]
        grace: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn load_pipeline(csv: &Path) -> anyhow::Result<(ParsedSheet, ColumnRules, ColumnRoles)> {
    let rules = ColumnRules::default();
    let raw = sheet::load_csv(csv)?;
    let parsed = sheet::parse_sheet(&raw, rules.header_marker())
        .with_context(|| format!("failed to parse {}", csv.display()))?;

    if parsed.skipped_marks_cells > 0 {
        eprintln!(
            "note: skipped {} unparsable cell(s) in the total-marks row",
            parsed.skipped_marks_cells
        );
    }

    let roles = columns::classify(&parsed.table.columns, &rules);
    Ok((parsed, rules, roles))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Marks { csv } => {
            let (parsed, _, _) = load_pipeline(&csv)?;
            if parsed.marks.is_empty() {
                println!("No total-marks row was found in the sheet.");
                return Ok(());
            }
            println!("Resolved maximum marks:");
            for entry in parsed.marks.entries() {
                if entry.component.is_empty() {
                    println!("- {}: {} marks", entry.subject, entry.marks);
                } else {
                    println!(
                        "- {} ({}): {} marks",
                        entry.subject, entry.component, entry.marks
                    );
                }
            }
        }
        Commands::Percent { csv } => {
            let (parsed, _, roles) = load_pipeline(&csv)?;
            let percents = grading::percent_table(&parsed.table, &roles, &parsed.marks);
            if !percents.has_data() {
                println!("{}", report::NO_TEE_DATA_NOTICE);
                return Ok(());
            }
            println!("TEE% per subject:");
            for row in &percents.rows {
                let scores: Vec<String> = percents
                    .tee_columns
                    .iter()
                    .zip(row.scores.iter().zip(&row.percents))
                    .map(|(column, (score, percent))| {
                        format!(
                            "{} {} ({}%)",
                            column,
                            report::fmt_score(*score),
                            report::fmt_score(*percent)
                        )
                    })
                    .collect();
                println!("- {}: {}", row.ids.join(" "), scores.join(", "));
            }
        }
        Commands::Score { csv, grace } => {
            let (parsed, rules, roles) = load_pipeline(&csv)?;
            if roles.tee_cols.is_empty() {
                println!("No TEE columns found in the sheet; nothing to grade.");
                return Ok(());
            }
            let reports =
                grading::grade_students(&parsed.table, &roles, &rules, &parsed.marks, grace);
            println!("Graded {} students (grace marks: {}):", reports.len(), grace);
            for student in &reports {
                let graced: Vec<&str> = student
                    .subjects
                    .iter()
                    .filter(|subject| subject.graced)
                    .map(|subject| subject.subject.as_str())
                    .collect();
                let suffix = if graced.is_empty() {
                    String::new()
                } else {
                    format!(" (grace in {})", graced.join(", "))
                };
                println!(
                    "- {} {}{}",
                    student.student_id,
                    if student.passed_all { "✅ Pass" } else { "❌ Fail" },
                    suffix
                );
            }
            let grace_passers = report::passed_with_grace(&reports);
            println!(
                "Passed only because of grace marks: {}",
                grace_passers.len()
            );
        }
        Commands::Report {
            csv,
            grace,
            out,
            json,
        } => {
            let (parsed, rules, roles) = load_pipeline(&csv)?;
            let percents = grading::percent_table(&parsed.table, &roles, &parsed.marks);
            let reports =
                grading::grade_students(&parsed.table, &roles, &rules, &parsed.marks, grace);
            let rendered = if json {
                report::report_json(grace, &parsed.marks, &percents, &reports)?
            } else {
                report::build_report(grace, &roles, &parsed.marks, &percents, &reports)
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
