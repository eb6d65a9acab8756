//! Summary command - dashboard figures for the dispatch office

use crate::cmd::{parse_date, read_dataset};
use crate::core::{summarize, DashboardSummary, Dataset, Transfer};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// Day to report on (YYYY-MM-DD), defaults to the local date
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct RecentRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Driver")]
    driver: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl RecentRow {
    fn new(transfer: &Transfer, dataset: &Dataset) -> Self {
        let driver = dataset
            .drivers()
            .get(&transfer.driver_id)
            .map_or("-", |d| d.name.as_str())
            .to_string();
        let company = dataset
            .companies()
            .get(&transfer.company_id)
            .map_or("-", |c| c.name.as_str())
            .to_string();
        RecentRow {
            date: transfer.date.format("%Y-%m-%d").to_string(),
            time: transfer.time.clone(),
            patient: transfer.patient_name.clone(),
            driver,
            company,
            status: transfer.status.label(),
        }
    }
}

#[derive(Serialize)]
struct SummaryData<'a> {
    today: NaiveDate,
    transfers_today: usize,
    transfers_this_month: usize,
    drivers: usize,
    companies: usize,
    expired_licenses: usize,
    recent: Vec<&'a str>,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let dataset = read_dataset(&self.dataset)?;
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let summary = summarize(
            &dataset.transfers,
            dataset.drivers(),
            dataset.companies(),
            today,
        );

        if self.json {
            self.print_json(&summary)
        } else {
            self.print_summary(&summary, &dataset);
            Ok(())
        }
    }

    fn print_summary(&self, summary: &DashboardSummary, dataset: &Dataset) {
        println!();
        println!("DASHBOARD ({})", summary.today.format("%d/%m/%Y"));
        println!();

        println!("TRANSFERS");
        println!(
            "  Today: {} | This month: {}",
            summary.transfers_today, summary.transfers_this_month
        );
        println!();

        println!("DIRECTORY");
        println!(
            "  Drivers: {} | Companies: {}",
            summary.drivers, summary.companies
        );
        if summary.expired_licenses > 0 {
            println!(
                "  \u{26A0} {} driver(s) with an expired licence",
                summary.expired_licenses
            );
        }
        println!();

        println!("RECENT ACTIVITY");
        if summary.recent.is_empty() {
            println!("  No transfers recorded");
        } else {
            let rows: Vec<RecentRow> = summary
                .recent
                .iter()
                .map(|t| RecentRow::new(t, dataset))
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        println!();
    }

    fn print_json(&self, summary: &DashboardSummary) -> anyhow::Result<()> {
        let data = SummaryData {
            today: summary.today,
            transfers_today: summary.transfers_today,
            transfers_this_month: summary.transfers_this_month,
            drivers: summary.drivers,
            companies: summary.companies,
            expired_licenses: summary.expired_licenses,
            recent: summary.recent.iter().map(|t| t.id.as_str()).collect(),
        };

        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}
