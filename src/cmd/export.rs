//! Export command - write dataset transfers back out in the import CSV layout

use crate::cmd::{parse_date, read_dataset};
use crate::core::write_transfers_csv;
use chrono::NaiveDate;
use clap::Args;
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportCommand {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// Only transfers on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Only transfers on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
}

impl ExportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let dataset = read_dataset(&self.dataset)?;

        let mut transfers: Vec<_> = dataset
            .transfers
            .iter()
            .filter(|t| self.from.is_none_or(|from| t.date >= from))
            .filter(|t| self.to.is_none_or(|to| t.date <= to))
            .cloned()
            .collect();
        transfers.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));

        write_transfers_csv(
            &transfers,
            dataset.drivers(),
            dataset.companies(),
            io::stdout().lock(),
        )
    }
}
