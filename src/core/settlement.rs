//! Billing settlements for companies and drivers.
//!
//! A settlement is always re-derived from the current transfers and the
//! party's current rates; past statements change when rates change.

use super::directory::{Company, Directory, Party, Rates};
use super::transfer::{Transfer, TripType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

/// Trips up to and including this distance are billed at the fixed rate
pub const URBAN_KM_THRESHOLD: Decimal = dec!(50);

/// Hours billed when a transfer has the waiting flag set
pub const WAITING_HOURS: Decimal = dec!(1);

/// Tunable business rules for the calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingRules {
    pub urban_km_threshold: Decimal,
    pub waiting_hours: Decimal,
}

impl Default for BillingRules {
    fn default() -> Self {
        BillingRules {
            urban_km_threshold: URBAN_KM_THRESHOLD,
            waiting_hours: WAITING_HOURS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartyKind {
    Company,
    Driver,
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyKind::Company => f.write_str("company"),
            PartyKind::Driver => f.write_str("driver"),
        }
    }
}

/// Leg of a round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TripPart {
    /// Origin to destination
    A,
    /// Destination back to origin
    B,
}

/// One billable line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementRow {
    pub date: NaiveDate,
    pub transfer_number: String,
    pub claim_number: String,
    pub patient_name: String,
    pub origin: String,
    pub destination: String,
    pub km: Decimal,
    pub urban_amount: Decimal,
    pub interurban_amount: Decimal,
    pub waiting_amount: Decimal,
    pub misc_expenses: Decimal,
    pub total_amount: Decimal,
    pub trip_part: Option<TripPart>,
}

/// Rows for one party over a period, with their grand total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Name of the billed party, when one was found
    pub party_name: Option<String>,
    pub rows: Vec<SettlementRow>,
    pub total: Decimal,
    /// Transfers left out because their amounts do not fit in a `Decimal`
    pub skipped: Vec<String>,
}

impl Statement {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Statement(Statement),
    /// The requested kind of settlement is not offered yet
    Unavailable(PartyKind),
}

/// Compute a settlement.
///
/// Missing party or period yields an empty statement. Driver settlements are
/// always [`Settlement::Unavailable`].
pub fn settle(
    kind: PartyKind,
    party_id: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    transfers: &[Transfer],
    companies: Directory<'_, Company>,
    rules: &BillingRules,
) -> Settlement {
    match kind {
        PartyKind::Driver => Settlement::Unavailable(kind),
        PartyKind::Company => {
            let (Some(party_id), Some(start), Some(end)) = (party_id, start, end) else {
                return Settlement::Statement(Statement::default());
            };
            let Some(company) = companies.get(party_id) else {
                log::warn!("Company {} not found", party_id);
                return Settlement::Statement(Statement::default());
            };
            Settlement::Statement(settle_company(company, start, end, transfers, rules))
        }
    }
}

/// Company settlement over the inclusive period `[start, end]`
pub fn settle_company(
    company: &Company,
    start: NaiveDate,
    end: NaiveDate,
    transfers: &[Transfer],
    rules: &BillingRules,
) -> Statement {
    let mut statement = Statement {
        party_name: Some(company.name().to_string()),
        ..Default::default()
    };
    let mut matched = 0;

    for transfer in transfers.iter().filter(|t| {
        t.company_id == company.id() && t.is_completed() && t.date >= start && t.date <= end
    }) {
        matched += 1;
        let billed = bill_transfer(transfer, company.rates(), rules).and_then(|rows| {
            let subtotal = rows
                .iter()
                .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.total_amount))?;
            let total = statement.total.checked_add(subtotal)?;
            Some((rows, total))
        });
        match billed {
            Some((rows, total)) => {
                statement.rows.extend(rows);
                statement.total = total;
            }
            None => {
                log::warn!("Transfer {} skipped: amounts overflow", transfer.id);
                statement.skipped.push(transfer.id.clone());
            }
        }
    }

    statement.rows.sort_by_key(|r| r.date);
    log::debug!(
        "Settled {} transfers for {} into {} rows, total {}",
        matched,
        company.name(),
        statement.rows.len(),
        statement.total
    );
    statement
}

/// Amounts charged for one transfer before splitting into legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Charges {
    urban: Decimal,
    interurban: Decimal,
    waiting: Decimal,
}

impl Charges {
    /// `None` when a product leaves the `Decimal` range
    fn compute(transfer: &Transfer, rates: &Rates, rules: &BillingRules) -> Option<Self> {
        let is_urban = transfer.km <= rules.urban_km_threshold;
        let interurban = if is_urban {
            Decimal::ZERO
        } else {
            transfer.km.checked_mul(rates.cost_per_km)?
        };
        let waiting = if transfer.waiting {
            rates.waiting_hour_cost.checked_mul(rules.waiting_hours)?
        } else {
            Decimal::ZERO
        };
        Some(Charges {
            urban: if is_urban { rates.fixed_rate } else { Decimal::ZERO },
            interurban,
            waiting,
        })
    }
}

fn bill_transfer(
    transfer: &Transfer,
    rates: &Rates,
    rules: &BillingRules,
) -> Option<Vec<SettlementRow>> {
    let charges = Charges::compute(transfer, rates, rules)?;
    let origin = transfer.origin_display();
    let destination = transfer.destination_display();

    let row = |origin: String,
               destination: String,
               urban: Decimal,
               interurban: Decimal,
               waiting: Decimal,
               part: Option<TripPart>|
     -> Option<SettlementRow> {
        Some(SettlementRow {
            date: transfer.date,
            transfer_number: transfer.transfer_number.clone(),
            claim_number: transfer.claim_number.clone(),
            patient_name: transfer.patient_name.clone(),
            origin,
            destination,
            km: transfer.km,
            urban_amount: urban,
            interurban_amount: interurban,
            waiting_amount: waiting,
            misc_expenses: Decimal::ZERO,
            total_amount: urban.checked_add(interurban)?.checked_add(waiting)?,
            trip_part: part,
        })
    };

    let rows = match transfer.trip_type {
        TripType::RoundTrip => {
            let urban = charges.urban / dec!(2);
            let interurban = charges.interurban / dec!(2);
            vec![
                // waiting is billed on the outbound leg only
                row(
                    origin.clone(),
                    destination.clone(),
                    urban,
                    interurban,
                    charges.waiting,
                    Some(TripPart::A),
                )?,
                row(
                    destination,
                    origin,
                    urban,
                    interurban,
                    Decimal::ZERO,
                    Some(TripPart::B),
                )?,
            ]
        }
        TripType::OneWay | TripType::MultiStopOneWay => vec![row(
            origin,
            destination,
            charges.urban,
            charges.interurban,
            charges.waiting,
            None,
        )?],
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::TransferStatus;

    fn acme() -> Company {
        Company {
            id: "c1".to_string(),
            name: "ACME".to_string(),
            cuit: String::new(),
            email: String::new(),
            contact: String::new(),
            rates: Rates {
                cost_per_km: dec!(5),
                fixed_rate: dec!(1000),
                waiting_hour_cost: dec!(300),
            },
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn transfer(id: &str, day: &str, km: Decimal, trip_type: TripType, waiting: bool) -> Transfer {
        Transfer {
            id: id.to_string(),
            internal_id: String::new(),
            transfer_number: format!("N-{id}"),
            claim_number: String::new(),
            art: String::new(),
            date: date(day),
            time: "00:00".to_string(),
            patient_name: "Ana Gomez".to_string(),
            patient_phone: String::new(),
            driver_id: "d1".to_string(),
            company_id: "c1".to_string(),
            origin_address: "Belgrano 100".to_string(),
            origin_city: "Rosario".to_string(),
            destination_address: "Hospital Central".to_string(),
            destination_city: "Funes".to_string(),
            km,
            trip_type,
            waiting,
            status: TransferStatus::Completed,
            notes: String::new(),
        }
    }

    fn settle_acme(transfers: &[Transfer], start: &str, end: &str) -> Statement {
        let companies = vec![acme()];
        match settle(
            PartyKind::Company,
            Some("c1"),
            Some(date(start)),
            Some(date(end)),
            transfers,
            Directory::new(&companies),
            &BillingRules::default(),
        ) {
            Settlement::Statement(s) => s,
            Settlement::Unavailable(kind) => panic!("unexpected unavailable {kind}"),
        }
    }

    #[test]
    fn urban_round_trip_with_waiting_splits_into_legs() {
        let transfers = vec![transfer("t1", "2024-05-10", dec!(30), TripType::RoundTrip, true)];
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        assert_eq!(statement.party_name.as_deref(), Some("ACME"));
        assert_eq!(statement.rows.len(), 2);

        let a = &statement.rows[0];
        assert_eq!(a.trip_part, Some(TripPart::A));
        assert_eq!(a.origin, "Belgrano 100, Rosario");
        assert_eq!(a.destination, "Hospital Central, Funes");
        assert_eq!(a.urban_amount, dec!(500));
        assert_eq!(a.waiting_amount, dec!(300));
        assert_eq!(a.total_amount, dec!(800));

        let b = &statement.rows[1];
        assert_eq!(b.trip_part, Some(TripPart::B));
        assert_eq!(b.origin, "Hospital Central, Funes");
        assert_eq!(b.destination, "Belgrano 100, Rosario");
        assert_eq!(b.urban_amount, dec!(500));
        assert_eq!(b.waiting_amount, Decimal::ZERO);
        assert_eq!(b.total_amount, dec!(500));

        assert_eq!(statement.total, dec!(1300));
    }

    #[test]
    fn one_way_interurban_single_row() {
        let mut company = acme();
        company.rates.cost_per_km = dec!(10);
        let transfers = vec![transfer("t1", "2024-05-10", dec!(80), TripType::OneWay, false)];

        let statement = settle_company(
            &company,
            date("2024-05-01"),
            date("2024-05-31"),
            &transfers,
            &BillingRules::default(),
        );

        assert_eq!(statement.rows.len(), 1);
        let row = &statement.rows[0];
        assert_eq!(row.trip_part, None);
        assert_eq!(row.urban_amount, Decimal::ZERO);
        assert_eq!(row.interurban_amount, dec!(800));
        assert_eq!(row.misc_expenses, Decimal::ZERO);
        assert_eq!(row.total_amount, dec!(800));
        assert_eq!(statement.total, dec!(800));
    }

    #[test]
    fn threshold_is_inclusive_for_urban() {
        let transfers = vec![
            transfer("t1", "2024-05-10", dec!(50), TripType::MultiStopOneWay, false),
            transfer("t2", "2024-05-10", dec!(50.1), TripType::MultiStopOneWay, false),
        ];
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        assert_eq!(statement.rows[0].urban_amount, dec!(1000));
        assert_eq!(statement.rows[0].interurban_amount, Decimal::ZERO);
        assert_eq!(statement.rows[1].urban_amount, Decimal::ZERO);
        assert_eq!(statement.rows[1].interurban_amount, dec!(250.5));
    }

    #[test]
    fn interurban_round_trip_halves_distance_charge() {
        let transfers = vec![transfer("t1", "2024-05-10", dec!(81), TripType::RoundTrip, false)];
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        assert_eq!(statement.rows[0].interurban_amount, dec!(202.5));
        assert_eq!(statement.rows[1].interurban_amount, dec!(202.5));
        assert_eq!(statement.total, dec!(405));
    }

    #[test]
    fn all_urban_round_trips_with_waiting_sum_to_fixed_plus_waiting() {
        let transfers: Vec<_> = (1..=5)
            .map(|i| {
                transfer(
                    &format!("t{i}"),
                    &format!("2024-05-0{i}"),
                    Decimal::from(i * 10),
                    TripType::RoundTrip,
                    true,
                )
            })
            .collect();
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        assert_eq!(statement.rows.len(), 10);
        for pair in statement.rows.chunks(2) {
            let sum: Decimal = pair.iter().map(|r| r.total_amount).sum();
            assert_eq!(sum, dec!(1300));
        }
    }

    #[test]
    fn overflowing_transfer_is_skipped_not_billed() {
        let mut company = acme();
        company.rates.cost_per_km = dec!(10000000000000000);
        let transfers = vec![
            transfer("t1", "2024-05-10", dec!(100000000000000), TripType::OneWay, false),
            transfer("t2", "2024-05-11", dec!(20), TripType::OneWay, false),
        ];

        let statement = settle_company(
            &company,
            date("2024-05-01"),
            date("2024-05-31"),
            &transfers,
            &BillingRules::default(),
        );

        assert_eq!(statement.skipped, vec!["t1".to_string()]);
        assert_eq!(statement.rows.len(), 1);
        assert_eq!(statement.rows[0].transfer_number, "N-t2");
        assert_eq!(statement.total, dec!(1000));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let transfers = vec![
            transfer("before", "2024-04-30", dec!(10), TripType::OneWay, false),
            transfer("start", "2024-05-01", dec!(10), TripType::OneWay, false),
            transfer("end", "2024-05-31", dec!(10), TripType::OneWay, false),
            transfer("after", "2024-06-01", dec!(10), TripType::OneWay, false),
        ];
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        let numbers: Vec<_> = statement
            .rows
            .iter()
            .map(|r| r.transfer_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["N-start", "N-end"]);
    }

    #[test]
    fn voided_and_other_company_transfers_excluded() {
        let mut voided = transfer("voided", "2024-05-02", dec!(10), TripType::OneWay, false);
        voided.status = TransferStatus::Voided;
        let mut other = transfer("other", "2024-05-02", dec!(10), TripType::OneWay, false);
        other.company_id = "c2".to_string();
        let kept = transfer("kept", "2024-05-02", dec!(10), TripType::OneWay, false);

        let statement = settle_acme(&[voided, other, kept], "2024-05-01", "2024-05-31");
        assert_eq!(statement.rows.len(), 1);
        assert_eq!(statement.rows[0].transfer_number, "N-kept");
    }

    #[test]
    fn rows_sorted_by_date_and_total_is_sum() {
        let transfers = vec![
            transfer("t3", "2024-05-20", dec!(70), TripType::OneWay, true),
            transfer("t1", "2024-05-03", dec!(12), TripType::RoundTrip, false),
            transfer("t2", "2024-05-11", dec!(33.3), TripType::MultiStopOneWay, true),
        ];
        let statement = settle_acme(&transfers, "2024-05-01", "2024-05-31");

        let dates: Vec<_> = statement.rows.iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        let sum: Decimal = statement.rows.iter().map(|r| r.total_amount).sum();
        assert_eq!(statement.total, sum);
        assert_eq!(statement.total, dec!(1000) + dec!(1300) + dec!(650));
    }

    #[test]
    fn rates_are_read_at_settlement_time() {
        let transfers = vec![transfer("t1", "2024-05-10", dec!(10), TripType::OneWay, false)];
        let mut companies = vec![acme()];
        let run = |companies: &[Company]| match settle(
            PartyKind::Company,
            Some("c1"),
            Some(date("2024-05-01")),
            Some(date("2024-05-31")),
            &transfers,
            Directory::new(companies),
            &BillingRules::default(),
        ) {
            Settlement::Statement(s) => s.total,
            Settlement::Unavailable(_) => unreachable!(),
        };

        assert_eq!(run(&companies), dec!(1000));
        companies[0].rates.fixed_rate = dec!(1200);
        assert_eq!(run(&companies), dec!(1200));
    }

    #[test]
    fn custom_rules_change_threshold_and_waiting_hours() {
        let companies = vec![acme()];
        let transfers = vec![transfer("t1", "2024-05-10", dec!(60), TripType::OneWay, true)];
        let rules = BillingRules {
            urban_km_threshold: dec!(100),
            waiting_hours: dec!(2),
        };

        let statement = settle_company(
            &companies[0],
            date("2024-05-01"),
            date("2024-05-31"),
            &transfers,
            &rules,
        );
        assert_eq!(statement.rows[0].urban_amount, dec!(1000));
        assert_eq!(statement.rows[0].waiting_amount, dec!(600));
    }

    #[test]
    fn driver_settlement_is_unavailable() {
        let companies = vec![acme()];
        let transfers = vec![transfer("t1", "2024-05-10", dec!(10), TripType::OneWay, false)];

        for party in [None, Some("d1"), Some("c1")] {
            let result = settle(
                PartyKind::Driver,
                party,
                Some(date("2024-05-01")),
                Some(date("2024-05-31")),
                &transfers,
                Directory::new(&companies),
                &BillingRules::default(),
            );
            assert_eq!(result, Settlement::Unavailable(PartyKind::Driver));
        }
    }

    #[test]
    fn missing_selection_or_unknown_company_is_empty() {
        let companies = vec![acme()];
        let transfers = vec![transfer("t1", "2024-05-10", dec!(10), TripType::OneWay, false)];
        let cases = [
            (None, Some(date("2024-05-01")), Some(date("2024-05-31"))),
            (Some("c1"), None, Some(date("2024-05-31"))),
            (Some("c1"), Some(date("2024-05-01")), None),
            (Some("missing"), Some(date("2024-05-01")), Some(date("2024-05-31"))),
        ];

        for (party, start, end) in cases {
            let result = settle(
                PartyKind::Company,
                party,
                start,
                end,
                &transfers,
                Directory::new(&companies),
                &BillingRules::default(),
            );
            assert_eq!(result, Settlement::Statement(Statement::default()));
        }
    }
}
