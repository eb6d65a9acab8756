//! Transfer command - record or edit a single transfer

use crate::cmd::{parse_date, read_dataset, write_dataset};
use crate::core::transfer::new_transfer_id;
use crate::core::{Transfer, TransferStatus, TripType};
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TransferCommand {
    #[command(subcommand)]
    action: TransferAction,
}

#[derive(Subcommand, Debug)]
enum TransferAction {
    /// Record a new transfer
    Add(TransferFields),
    /// Change fields of an existing transfer
    Edit {
        /// Id of the transfer to edit
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: TransferFields,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TripTypeArg {
    RoundTrip,
    OneWay,
    MultiStop,
}

impl From<TripTypeArg> for TripType {
    fn from(arg: TripTypeArg) -> Self {
        match arg {
            TripTypeArg::RoundTrip => TripType::RoundTrip,
            TripTypeArg::OneWay => TripType::OneWay,
            TripTypeArg::MultiStop => TripType::MultiStopOneWay,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Completed,
    Voided,
}

impl From<StatusArg> for TransferStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Completed => TransferStatus::Completed,
            StatusArg::Voided => TransferStatus::Voided,
        }
    }
}

#[derive(Args, Debug)]
struct TransferFields {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// Transfer date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Pickup time (HH:MM)
    #[arg(long)]
    time: Option<String>,

    #[arg(long)]
    patient: Option<String>,

    #[arg(long)]
    patient_phone: Option<String>,

    /// Driver id
    #[arg(long)]
    driver: Option<String>,

    /// Company id
    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    origin_address: Option<String>,

    #[arg(long)]
    origin_city: Option<String>,

    #[arg(long)]
    destination_address: Option<String>,

    #[arg(long)]
    destination_city: Option<String>,

    #[arg(long)]
    km: Option<Decimal>,

    #[arg(long, value_enum)]
    trip_type: Option<TripTypeArg>,

    /// Whether the driver waited for the patient
    #[arg(long)]
    waiting: Option<bool>,

    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    #[arg(long)]
    claim_number: Option<String>,

    /// Occupational risk insurer
    #[arg(long)]
    art: Option<String>,

    #[arg(long)]
    transfer_number: Option<String>,

    #[arg(long)]
    internal_id: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl TransferFields {
    fn apply(&self, transfer: &mut Transfer) {
        let text_fields = [
            (&self.time, &mut transfer.time),
            (&self.patient, &mut transfer.patient_name),
            (&self.patient_phone, &mut transfer.patient_phone),
            (&self.driver, &mut transfer.driver_id),
            (&self.company, &mut transfer.company_id),
            (&self.origin_address, &mut transfer.origin_address),
            (&self.origin_city, &mut transfer.origin_city),
            (&self.destination_address, &mut transfer.destination_address),
            (&self.destination_city, &mut transfer.destination_city),
            (&self.claim_number, &mut transfer.claim_number),
            (&self.art, &mut transfer.art),
            (&self.transfer_number, &mut transfer.transfer_number),
            (&self.internal_id, &mut transfer.internal_id),
            (&self.notes, &mut transfer.notes),
        ];
        for (value, field) in text_fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        if let Some(date) = self.date {
            transfer.date = date;
        }
        if let Some(km) = self.km {
            transfer.km = km;
        }
        if let Some(trip_type) = self.trip_type {
            transfer.trip_type = trip_type.into();
        }
        if let Some(waiting) = self.waiting {
            transfer.waiting = waiting;
        }
        if let Some(status) = self.status {
            transfer.status = status.into();
        }
    }
}

/// Blank transfer for the given day, filled in from the command line
fn new_transfer(date: NaiveDate) -> Transfer {
    Transfer {
        id: new_transfer_id(),
        internal_id: String::new(),
        transfer_number: String::new(),
        claim_number: String::new(),
        art: String::new(),
        date,
        time: String::new(),
        patient_name: String::new(),
        patient_phone: String::new(),
        driver_id: String::new(),
        company_id: String::new(),
        origin_address: String::new(),
        origin_city: String::new(),
        destination_address: String::new(),
        destination_city: String::new(),
        km: Decimal::ZERO,
        trip_type: TripType::default(),
        waiting: false,
        status: TransferStatus::default(),
        notes: String::new(),
    }
}

impl TransferCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let fields = match &self.action {
            TransferAction::Add(fields) | TransferAction::Edit { fields, .. } => fields,
        };
        let mut dataset = read_dataset(&fields.dataset)?;

        let mut transfer = match &self.action {
            TransferAction::Add(_) => match fields.date {
                Some(date) => new_transfer(date),
                None => anyhow::bail!("transfer is missing required field: date"),
            },
            TransferAction::Edit { id, .. } => {
                match dataset.transfers.iter().find(|t| &t.id == id) {
                    Some(transfer) => transfer.clone(),
                    None => anyhow::bail!("No transfer with id {}", id),
                }
            }
        };
        fields.apply(&mut transfer);

        let id = transfer.id.clone();
        dataset.upsert_transfer(transfer)?;
        write_dataset(&fields.dataset, &dataset)?;
        println!("Saved transfer {}", id);
        Ok(())
    }
}
