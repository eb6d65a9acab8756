//! Validate command - check an import file without touching the dataset

use crate::cmd::{read_csv_text, read_dataset};
use crate::core::{import_transfers, ImportResult, InvalidRow, RowError};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// CSV file of transfers to check ("-" reads stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A rejected row for output
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    row: usize,
    error: String,
    cells: Vec<(String, String)>,
}

impl From<&InvalidRow> for ValidationIssue {
    fn from(invalid: &InvalidRow) -> Self {
        ValidationIssue {
            row: invalid.row_index,
            error: invalid.message(),
            cells: invalid.row.clone(),
        }
    }
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    valid_count: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let dataset = read_dataset(&self.dataset)?;
        let text = read_csv_text(&self.file)?;
        let result = import_transfers(&text, dataset.drivers(), dataset.companies());

        if self.json {
            print_json(&result)?;
        } else {
            print_text(&result);
        }

        // Exit with code 1 if issues found
        if !result.invalid.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn issues(result: &ImportResult) -> Vec<ValidationIssue> {
    result.invalid.iter().map(Into::into).collect()
}

pub fn print_text(result: &ImportResult) {
    println!();
    println!("VALIDATION RESULTS");
    println!();
    println!("  {} valid row(s)", result.valid.len());

    if result.invalid.is_empty() {
        println!("\u{2713} No issues found.");
    } else {
        println!("\u{26A0} {} row(s) with errors:", result.invalid.len());
        println!();

        for invalid in &result.invalid {
            if invalid.errors.iter().any(RowError::is_structural) {
                println!("  File: {}", invalid.message());
            } else {
                println!("  Row {}: {}", invalid.row_index, invalid.message());
            }
        }
    }
    println!();
}

pub fn print_json(result: &ImportResult) -> anyhow::Result<()> {
    let issues = issues(result);
    let output = ValidationOutput {
        valid_count: result.valid.len(),
        issue_count: issues.len(),
        issues,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
