pub mod company;
pub mod driver;
pub mod export;
pub mod import;
pub mod schema;
pub mod settle;
pub mod summary;
pub mod transfer;
pub mod validate;

use crate::core::{self, Dataset};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;

/// Read the dataset JSON file
pub fn read_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let file = File::open(path)
        .map_err(|err| anyhow::anyhow!("Cannot open dataset {}: {}", path.display(), err))?;
    core::read_dataset_json(BufReader::new(file))
}

/// Write the dataset JSON file, replacing its contents
pub fn write_dataset(path: &Path, dataset: &Dataset) -> anyhow::Result<()> {
    let file = File::create(path)?;
    core::write_dataset_json(dataset, BufWriter::new(file))?;
    log::info!("Wrote dataset to {}", path.display());
    Ok(())
}

/// Read a CSV file as text (or stdin with "-")
pub fn read_csv_text(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let mut text = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut text)?;
        Ok(text)
    }
}

fn read_from_stdin() -> anyhow::Result<String> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    if text.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }
    Ok(text)
}

/// Parse a `YYYY-MM-DD` command-line date
pub fn parse_date(s: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

pub fn format_money(amount: rust_decimal::Decimal) -> String {
    format!("${:.2}", amount)
}
