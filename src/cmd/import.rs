//! Import command - bulk load transfers from CSV into the dataset

use crate::cmd::validate;
use crate::cmd::{read_csv_text, read_dataset, write_dataset};
use crate::core::{import_transfers, Transfer};
use clap::Args;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

/// Transfers shown in the preview table
const PREVIEW_ROWS: usize = 5;

#[derive(Args, Debug)]
pub struct ImportCommand {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// CSV file of transfers to import ("-" reads stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Save valid transfers into the dataset file
    #[arg(short, long)]
    write: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Destination")]
    destination: String,
}

impl From<&Transfer> for PreviewRow {
    fn from(t: &Transfer) -> Self {
        PreviewRow {
            date: t.date.format("%Y-%m-%d").to_string(),
            patient: t.patient_name.clone(),
            origin: t.origin_address.clone(),
            destination: t.destination_address.clone(),
        }
    }
}

impl ImportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut dataset = read_dataset(&self.dataset)?;
        let text = read_csv_text(&self.file)?;
        let result = import_transfers(&text, dataset.drivers(), dataset.companies());

        if self.json {
            validate::print_json(&result)?;
        } else {
            validate::print_text(&result);
            if !result.valid.is_empty() {
                println!("Transfers to import (first {} rows):", PREVIEW_ROWS);
                let preview: Vec<PreviewRow> = result
                    .valid
                    .iter()
                    .take(PREVIEW_ROWS)
                    .map(Into::into)
                    .collect();
                println!("{}", Table::new(preview).with(Style::rounded()));
            }
        }

        if self.write {
            if result.valid.is_empty() {
                anyhow::bail!("No valid transfers to save");
            }
            let count = result.valid.len();
            dataset.append_transfers(result.valid)?;
            write_dataset(&self.dataset, &dataset)?;
            if !self.json {
                println!("Saved {} transfers", count);
            }
        }
        Ok(())
    }
}
