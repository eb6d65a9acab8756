use super::directory::{Company, Directory, Driver};
use super::transfer::Transfer;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Number of transfers listed as recent activity
pub const RECENT_TRANSFERS: usize = 5;

/// Headline figures for the office dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub today: NaiveDate,
    /// Completed transfers dated today
    pub transfers_today: usize,
    /// Completed transfers from the first day of this month onwards
    pub transfers_this_month: usize,
    pub drivers: usize,
    pub companies: usize,
    pub expired_licenses: usize,
    pub recent: Vec<Transfer>,
}

pub fn summarize(
    transfers: &[Transfer],
    drivers: Directory<'_, Driver>,
    companies: Directory<'_, Company>,
    today: NaiveDate,
) -> DashboardSummary {
    let first_of_month = today.with_day(1).unwrap_or(today);

    let transfers_today = transfers
        .iter()
        .filter(|t| t.is_completed() && t.date == today)
        .count();
    let transfers_this_month = transfers
        .iter()
        .filter(|t| t.is_completed() && t.date >= first_of_month)
        .count();

    let mut recent: Vec<Transfer> = transfers.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time)));
    recent.truncate(RECENT_TRANSFERS);

    DashboardSummary {
        today,
        transfers_today,
        transfers_this_month,
        drivers: drivers.len(),
        companies: companies.len(),
        expired_licenses: drivers.iter().filter(|d| d.license_expired(today)).count(),
        recent,
    }
}
