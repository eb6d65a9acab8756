//! Driver command - register or edit a driver in the dataset

use crate::cmd::{parse_date, read_dataset, write_dataset};
use crate::core::directory::new_driver_id;
use crate::core::Driver;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DriverCommand {
    #[command(subcommand)]
    action: DriverAction,
}

#[derive(Subcommand, Debug)]
enum DriverAction {
    /// Register a new driver
    Add(DriverFields),
    /// Change fields of an existing driver
    Edit {
        /// Id of the driver to edit
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: DriverFields,
    },
}

#[derive(Args, Debug)]
struct DriverFields {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    /// Full name
    #[arg(long)]
    name: Option<String>,

    /// National identity document number
    #[arg(long)]
    dni: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Licence expiry date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    license_expiry: Option<NaiveDate>,

    #[arg(long)]
    cost_per_km: Option<Decimal>,

    #[arg(long)]
    fixed_rate: Option<Decimal>,

    #[arg(long)]
    waiting_hour_cost: Option<Decimal>,
}

impl DriverFields {
    fn apply(&self, driver: &mut Driver) {
        if let Some(name) = &self.name {
            driver.name = name.clone();
        }
        if let Some(dni) = &self.dni {
            driver.dni = dni.clone();
        }
        if let Some(phone) = &self.phone {
            driver.phone = phone.clone();
        }
        if let Some(email) = &self.email {
            driver.email = email.clone();
        }
        if self.license_expiry.is_some() {
            driver.license_expiry = self.license_expiry;
        }
        if let Some(cost) = self.cost_per_km {
            driver.rates.cost_per_km = cost;
        }
        if let Some(rate) = self.fixed_rate {
            driver.rates.fixed_rate = rate;
        }
        if let Some(cost) = self.waiting_hour_cost {
            driver.rates.waiting_hour_cost = cost;
        }
    }
}

impl DriverCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let fields = match &self.action {
            DriverAction::Add(fields) | DriverAction::Edit { fields, .. } => fields,
        };
        let mut dataset = read_dataset(&fields.dataset)?;

        let mut driver = match &self.action {
            DriverAction::Add(_) => Driver {
                id: new_driver_id(),
                ..Default::default()
            },
            DriverAction::Edit { id, .. } => match dataset.drivers().get(id) {
                Some(driver) => driver.clone(),
                None => anyhow::bail!("No driver with id {}", id),
            },
        };
        fields.apply(&mut driver);

        let id = driver.id.clone();
        dataset.upsert_driver(driver)?;
        write_dataset(&fields.dataset, &dataset)?;
        println!("Saved driver {}", id);
        Ok(())
    }
}
