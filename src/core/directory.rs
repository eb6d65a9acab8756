use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Billing rates shared by drivers and companies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rates {
    /// Charged per kilometre on interurban trips
    #[serde(default)]
    #[schemars(with = "f64")]
    pub cost_per_km: Decimal,
    /// Flat charge for an urban trip
    #[serde(default)]
    #[schemars(with = "f64")]
    pub fixed_rate: Decimal,
    /// Charged per billable waiting hour
    #[serde(default)]
    #[schemars(with = "f64")]
    pub waiting_hour_cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Driver {
    pub id: String,
    pub name: String,
    /// National identity document number
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub license_expiry: Option<NaiveDate>,
    #[serde(flatten)]
    pub rates: Rates,
}

impl Driver {
    /// A driver without a recorded expiry date is never reported as expired
    pub fn license_expired(&self, on: NaiveDate) -> bool {
        self.license_expiry.is_some_and(|expiry| expiry < on)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Company {
    pub id: String,
    pub name: String,
    /// Tax identification number
    #[serde(default)]
    pub cuit: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact: String,
    #[serde(flatten)]
    pub rates: Rates,
}

pub fn new_driver_id() -> String {
    format!("driver_{}", uuid::Uuid::new_v4().simple())
}

pub fn new_company_id() -> String {
    format!("comp_{}", uuid::Uuid::new_v4().simple())
}

/// A billing party that can be looked up by id or by name.
pub trait Party {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn rates(&self) -> &Rates;
}

impl Party for Driver {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rates(&self) -> &Rates {
        &self.rates
    }
}

impl Party for Company {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rates(&self) -> &Rates {
        &self.rates
    }
}

/// Read-only, ordered view over drivers or companies
#[derive(Debug)]
pub struct Directory<'a, T> {
    entries: &'a [T],
}

impl<T> Clone for Directory<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Directory<'_, T> {}

impl<'a, T: Party> Directory<'a, T> {
    pub fn new(entries: &'a [T]) -> Self {
        Directory { entries }
    }

    pub fn get(&self, id: &str) -> Option<&'a T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Case-insensitive exact name match.
    ///
    /// Resolves only when exactly one entry carries the name, so an ambiguous
    /// name never silently picks the first record.
    pub fn find_by_name(&self, name: &str) -> Option<&'a T> {
        let name = name.trim().to_lowercase();
        let mut matches = self
            .entries
            .iter()
            .filter(|e| e.name().trim().to_lowercase() == name);
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
