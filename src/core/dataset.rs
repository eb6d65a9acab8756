use super::directory::{Company, Directory, Driver};
use super::transfer::Transfer;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("duplicate driver id: {0}")]
    DuplicateDriverId(String),
    #[error("duplicate company id: {0}")]
    DuplicateCompanyId(String),
    #[error("duplicate transfer id: {0}")]
    DuplicateTransferId(String),
    #[error("{record} is missing required field: {field}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("transfer km must not be negative")]
    NegativeKm,
    #[error("unknown driver id: {0}")]
    UnknownDriver(String),
    #[error("unknown company id: {0}")]
    UnknownCompany(String),
}

/// Reference data and transfers kept by the dispatch office
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Dataset {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

impl Dataset {
    pub fn drivers(&self) -> Directory<'_, Driver> {
        Directory::new(&self.drivers)
    }

    pub fn companies(&self) -> Directory<'_, Company> {
        Directory::new(&self.companies)
    }

    /// Insert a driver, or replace the one with the same id
    pub fn upsert_driver(&mut self, driver: Driver) -> Result<(), DatasetError> {
        let missing = |field| DatasetError::MissingField {
            record: "driver",
            field,
        };
        if is_blank(&driver.name) {
            return Err(missing("name"));
        }
        if is_blank(&driver.dni) {
            return Err(missing("dni"));
        }
        if driver.license_expiry.is_none() {
            return Err(missing("license_expiry"));
        }
        upsert(&mut self.drivers, driver, |d| &d.id);
        Ok(())
    }

    /// Insert a company, or replace the one with the same id
    pub fn upsert_company(&mut self, company: Company) -> Result<(), DatasetError> {
        let missing = |field| DatasetError::MissingField {
            record: "company",
            field,
        };
        if is_blank(&company.name) {
            return Err(missing("name"));
        }
        if is_blank(&company.cuit) {
            return Err(missing("cuit"));
        }
        upsert(&mut self.companies, company, |c| &c.id);
        Ok(())
    }

    /// Insert a transfer, or replace the one with the same id.
    ///
    /// The driver and company it points at must already exist.
    pub fn upsert_transfer(&mut self, transfer: Transfer) -> Result<(), DatasetError> {
        let required = [
            ("time", &transfer.time),
            ("patient_name", &transfer.patient_name),
            ("origin_address", &transfer.origin_address),
            ("origin_city", &transfer.origin_city),
            ("destination_address", &transfer.destination_address),
            ("destination_city", &transfer.destination_city),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| is_blank(value)) {
            return Err(DatasetError::MissingField {
                record: "transfer",
                field: *field,
            });
        }
        if transfer.km.is_sign_negative() {
            return Err(DatasetError::NegativeKm);
        }
        if self.drivers().get(&transfer.driver_id).is_none() {
            return Err(DatasetError::UnknownDriver(transfer.driver_id));
        }
        if self.companies().get(&transfer.company_id).is_none() {
            return Err(DatasetError::UnknownCompany(transfer.company_id));
        }
        upsert(&mut self.transfers, transfer, |t| &t.id);
        Ok(())
    }

    /// Append imported transfers, keeping their order
    pub fn append_transfers(&mut self, transfers: Vec<Transfer>) -> Result<(), DatasetError> {
        let mut seen: HashSet<&str> = self.transfers.iter().map(|t| t.id.as_str()).collect();
        for transfer in &transfers {
            if !seen.insert(&transfer.id) {
                return Err(DatasetError::DuplicateTransferId(transfer.id.clone()));
            }
        }
        self.transfers.extend(transfers);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut seen = HashSet::new();
        for driver in &self.drivers {
            if !seen.insert(driver.id.as_str()) {
                return Err(DatasetError::DuplicateDriverId(driver.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for company in &self.companies {
            if !seen.insert(company.id.as_str()) {
                return Err(DatasetError::DuplicateCompanyId(company.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for transfer in &self.transfers {
            if !seen.insert(transfer.id.as_str()) {
                return Err(DatasetError::DuplicateTransferId(transfer.id.clone()));
            }
        }
        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn upsert<T>(records: &mut Vec<T>, record: T, id: impl Fn(&T) -> &String) {
    match records.iter().position(|r| id(r) == id(&record)) {
        Some(i) => records[i] = record,
        None => records.push(record),
    }
}

/// Read a dataset from JSON
pub fn read_dataset_json<R: Read>(reader: R) -> anyhow::Result<Dataset> {
    let dataset: Dataset = serde_json::from_reader(reader)?;
    dataset.validate()?;
    log::debug!(
        "Read {} drivers, {} companies, {} transfers",
        dataset.drivers.len(),
        dataset.companies.len(),
        dataset.transfers.len()
    );
    Ok(dataset)
}

/// Write a dataset as pretty-printed JSON
pub fn write_dataset_json<W: Write>(dataset: &Dataset, writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, dataset)?;
    Ok(())
}
