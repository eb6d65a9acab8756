//! Company command - register or edit a billed company

use crate::cmd::{read_dataset, write_dataset};
use crate::core::directory::new_company_id;
use crate::core::Company;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CompanyCommand {
    #[command(subcommand)]
    action: CompanyAction,
}

#[derive(Subcommand, Debug)]
enum CompanyAction {
    /// Register a new company
    Add(CompanyFields),
    /// Change fields of an existing company
    Edit {
        /// Id of the company to edit
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: CompanyFields,
    },
}

#[derive(Args, Debug)]
struct CompanyFields {
    /// JSON dataset with drivers, companies and transfers
    #[arg(short, long)]
    dataset: PathBuf,

    #[arg(long)]
    name: Option<String>,

    /// Tax identification number
    #[arg(long)]
    cuit: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Contact person
    #[arg(long)]
    contact: Option<String>,

    /// Charged per km on interurban trips
    #[arg(long)]
    cost_per_km: Option<Decimal>,

    /// Flat charge for an urban trip
    #[arg(long)]
    fixed_rate: Option<Decimal>,

    /// Charged per billable waiting hour
    #[arg(long)]
    waiting_hour_cost: Option<Decimal>,
}

impl CompanyFields {
    fn apply(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(cuit) = &self.cuit {
            company.cuit = cuit.clone();
        }
        if let Some(email) = &self.email {
            company.email = email.clone();
        }
        if let Some(contact) = &self.contact {
            company.contact = contact.clone();
        }
        if let Some(cost) = self.cost_per_km {
            company.rates.cost_per_km = cost;
        }
        if let Some(rate) = self.fixed_rate {
            company.rates.fixed_rate = rate;
        }
        if let Some(cost) = self.waiting_hour_cost {
            company.rates.waiting_hour_cost = cost;
        }
    }
}

impl CompanyCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let fields = match &self.action {
            CompanyAction::Add(fields) | CompanyAction::Edit { fields, .. } => fields,
        };
        let mut dataset = read_dataset(&fields.dataset)?;

        let mut company = match &self.action {
            CompanyAction::Add(_) => Company {
                id: new_company_id(),
                ..Default::default()
            },
            CompanyAction::Edit { id, .. } => match dataset.companies().get(id) {
                Some(company) => company.clone(),
                None => anyhow::bail!("No company with id {}", id),
            },
        };
        fields.apply(&mut company);

        let id = company.id.clone();
        dataset.upsert_company(company)?;
        write_dataset(&fields.dataset, &dataset)?;
        println!("Saved company {}", id);
        Ok(())
    }
}
