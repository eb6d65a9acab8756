//! Settle command - billing statement for a company or driver over a period

use crate::cmd::{format_money, parse_date, read_dataset};
use crate::core::settlement::{URBAN_KM_THRESHOLD, WAITING_HOURS};
use crate::core::{settle, BillingRules, PartyKind, Settlement, SettlementRow, Statement, TripPart};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SettleCommand {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// Who is being settled
    #[arg(short, long, value_enum, default_value_t = PartyKindArg::Company)]
    kind: PartyKindArg,

    /// Id of the company or driver
    #[arg(short, long)]
    party: Option<String>,

    /// First day of the period (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Trips up to this many km are billed at the fixed rate
    #[arg(long, default_value_t = URBAN_KM_THRESHOLD)]
    urban_threshold_km: Decimal,

    /// Hours billed when a transfer had waiting time
    #[arg(long, default_value_t = WAITING_HOURS)]
    waiting_hours: Decimal,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PartyKindArg {
    #[default]
    Company,
    Driver,
}

impl From<PartyKindArg> for PartyKind {
    fn from(arg: PartyKindArg) -> Self {
        match arg {
            PartyKindArg::Company => PartyKind::Company,
            PartyKindArg::Driver => PartyKind::Driver,
        }
    }
}

/// Row for the settlement table output
#[derive(Debug, Clone, Tabled, Serialize)]
struct StatementRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Transfer #")]
    transfer_number: String,
    #[tabled(rename = "Claim #")]
    claim_number: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Leg")]
    leg: String,
    #[tabled(rename = "Km")]
    km: String,
    #[tabled(rename = "Urban")]
    urban: String,
    #[tabled(rename = "Interurban")]
    interurban: String,
    #[tabled(rename = "Waiting")]
    waiting: String,
    #[tabled(rename = "Misc.")]
    misc: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl From<&SettlementRow> for StatementRow {
    fn from(row: &SettlementRow) -> Self {
        StatementRow {
            date: row.date.format("%Y-%m-%d").to_string(),
            transfer_number: row.transfer_number.clone(),
            claim_number: row.claim_number.clone(),
            patient: row.patient_name.clone(),
            origin: row.origin.clone(),
            destination: row.destination.clone(),
            leg: match row.trip_part {
                Some(TripPart::A) => "A".to_string(),
                Some(TripPart::B) => "B".to_string(),
                None => String::new(),
            },
            km: row.km.normalize().to_string(),
            urban: format!("{:.2}", row.urban_amount),
            interurban: format!("{:.2}", row.interurban_amount),
            waiting: format!("{:.2}", row.waiting_amount),
            misc: format!("{:.2}", row.misc_expenses),
            total: format!("{:.2}", row.total_amount),
        }
    }
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct SettlementOutput<'a> {
    kind: PartyKind,
    party: Option<&'a str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    statement: Option<&'a Statement>,
}

impl SettleCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let dataset = read_dataset(&self.dataset)?;
        let rules = BillingRules {
            urban_km_threshold: self.urban_threshold_km,
            waiting_hours: self.waiting_hours,
        };
        let kind: PartyKind = self.kind.into();

        let settlement = settle(
            kind,
            self.party.as_deref(),
            self.from,
            self.to,
            &dataset.transfers,
            dataset.companies(),
            &rules,
        );

        if self.json {
            return self.print_json(kind, &settlement);
        }

        match settlement {
            Settlement::Unavailable(kind) => {
                println!("Settlement for {kind}s is not available yet.");
                Ok(())
            }
            Settlement::Statement(statement) if self.csv => self.write_csv(&statement),
            Settlement::Statement(statement) => {
                self.print_table(&statement);
                Ok(())
            }
        }
    }

    fn print_table(&self, statement: &Statement) {
        let (Some(name), Some(from), Some(to)) = (&statement.party_name, self.from, self.to) else {
            println!("Select a company and a period to see its settlement");
            return;
        };

        println!();
        println!("SETTLEMENT FOR {}", name.to_uppercase());
        println!(
            "Period: {} - {}",
            from.format("%d/%m/%Y"),
            to.format("%d/%m/%Y")
        );
        println!();

        if statement.is_empty() {
            println!("No completed transfers in this period");
        } else {
            let rows: Vec<StatementRow> = statement.rows.iter().map(Into::into).collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(7..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        if !statement.skipped.is_empty() {
            println!();
            println!(
                "\u{26A0} Not billed, amounts out of range: {}",
                statement.skipped.join(", ")
            );
        }

        println!();
        println!("TOTAL: {}", format_money(statement.total));
        println!();
    }

    fn write_csv(&self, statement: &Statement) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in &statement.rows {
            wtr.serialize(StatementRow::from(row))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn print_json(&self, kind: PartyKind, settlement: &Settlement) -> anyhow::Result<()> {
        let statement = match settlement {
            Settlement::Statement(statement) => Some(statement),
            Settlement::Unavailable(_) => None,
        };
        let output = SettlementOutput {
            kind,
            party: self.party.as_deref(),
            from: self.from,
            to: self.to,
            available: statement.is_some(),
            statement,
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
