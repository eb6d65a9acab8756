//! Schema command - print expected input formats

use crate::core::import::columns;
use crate::core::{Dataset, EXPORT_COLUMNS, REQUIRED_COLUMNS};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the dataset file
    JsonSchema,
    /// CSV header row for transfer imports
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(Dataset);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        println!("{}", EXPORT_COLUMNS.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("CSV Import Format");
        println!("=================");
        println!();
        for (name, description) in CSV_FIELD_DESCRIPTIONS {
            let req = if REQUIRED_COLUMNS.contains(name) {
                "required"
            } else {
                "optional"
            };
            println!("{:20} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Fields are split on every comma; quotes are not interpreted.");
        Ok(())
    }
}

const CSV_FIELD_DESCRIPTIONS: &[(&str, &str)] = &[
    (columns::DATE, "Transfer date (YYYY-MM-DD)"),
    (columns::TIME, "Pickup time, defaults to 00:00"),
    (columns::PATIENT, "Patient full name"),
    (columns::PATIENT_PHONE, "Patient phone number"),
    (
        columns::DRIVER_NAME,
        "Driver name, matched case-insensitively against the directory",
    ),
    (
        columns::COMPANY_NAME,
        "Company name, matched case-insensitively against the directory",
    ),
    (columns::ORIGIN_ADDRESS, "Pickup address"),
    (columns::ORIGIN_CITY, "Pickup city"),
    (columns::DESTINATION_ADDRESS, "Drop-off address"),
    (columns::DESTINATION_CITY, "Drop-off city"),
    (columns::KM, "Distance in km (non-negative number, 0 if empty)"),
    (columns::WAITING, "\"si\" when the driver waited for the patient"),
    (columns::STATUS, "Realizado or Anulado, defaults to Realizado"),
    (
        columns::TRIP_TYPE,
        "IDA Y VUELTA, IDA or IDA MULTIPLE, defaults to IDA Y VUELTA",
    ),
    (columns::CLAIM_NUMBER, "Insurance claim number"),
    (columns::ART, "Occupational risk insurer"),
    (columns::TRANSFER_NUMBER, "Transfer number assigned by the insurer"),
    (columns::INTERNAL_ID, "Internal reference"),
    (columns::NOTES, "Free-form notes"),
];
