use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a transfer is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TripType {
    /// Billed as two legs, A (outbound) and B (return)
    #[default]
    RoundTrip,
    OneWay,
    MultiStopOneWay,
}

impl TripType {
    /// Parse the labels used by the dispatch office, or their English spellings.
    pub fn parse(s: &str) -> Option<TripType> {
        match s.trim().to_uppercase().as_str() {
            "IDA Y VUELTA" | "ROUND-TRIP" | "ROUND TRIP" => Some(TripType::RoundTrip),
            "IDA" | "ONE-WAY" | "ONE WAY" => Some(TripType::OneWay),
            "IDA MULTIPLE" | "IDA MÚLTIPLE" | "MULTI-STOP" | "MULTI-STOP ONE-WAY" => {
                Some(TripType::MultiStopOneWay)
            }
            _ => None,
        }
    }

    /// Label written to exported CSV files
    pub fn label(self) -> &'static str {
        match self {
            TripType::RoundTrip => "IDA Y VUELTA",
            TripType::OneWay => "IDA",
            TripType::MultiStopOneWay => "IDA MULTIPLE",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TransferStatus {
    #[default]
    Completed,
    Voided,
}

impl TransferStatus {
    /// Only the literal `Anulado` voids a transfer.
    pub fn parse(s: &str) -> TransferStatus {
        if s == "Anulado" {
            TransferStatus::Voided
        } else {
            TransferStatus::Completed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransferStatus::Completed => "Realizado",
            TransferStatus::Voided => "Anulado",
        }
    }
}

/// One patient transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transfer {
    pub id: String,
    #[serde(default)]
    pub internal_id: String,
    #[serde(default)]
    pub transfer_number: String,
    #[serde(default)]
    pub claim_number: String,
    /// Insurer (ART) code
    #[serde(default)]
    pub art: String,
    #[schemars(with = "String")]
    pub date: NaiveDate,
    /// Local time of day, `HH:MM`
    #[serde(default = "default_time")]
    pub time: String,
    pub patient_name: String,
    #[serde(default)]
    pub patient_phone: String,
    pub driver_id: String,
    pub company_id: String,
    pub origin_address: String,
    #[serde(default)]
    pub origin_city: String,
    pub destination_address: String,
    #[serde(default)]
    pub destination_city: String,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub km: Decimal,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub waiting: bool,
    #[serde(default)]
    pub status: TransferStatus,
    #[serde(default)]
    pub notes: String,
}

pub(crate) fn default_time() -> String {
    "00:00".to_string()
}

impl Transfer {
    pub fn is_completed(&self) -> bool {
        self.status == TransferStatus::Completed
    }

    pub fn origin_display(&self) -> String {
        format!("{}, {}", self.origin_address, self.origin_city)
    }

    pub fn destination_display(&self) -> String {
        format!("{}, {}", self.destination_address, self.destination_city)
    }
}

/// Generate a fresh transfer id
pub fn new_transfer_id() -> String {
    format!("trans_{}", uuid::Uuid::new_v4().simple())
}
