use super::directory::{Company, Directory, Driver};
use super::import::columns;
use super::transfer::Transfer;
use serde::Serialize;
use std::io::Write;

/// Every column written by the exporter, in file order
pub const EXPORT_COLUMNS: &[&str] = &[
    columns::DATE,
    columns::TIME,
    columns::PATIENT,
    columns::PATIENT_PHONE,
    columns::DRIVER_NAME,
    columns::COMPANY_NAME,
    columns::ORIGIN_ADDRESS,
    columns::ORIGIN_CITY,
    columns::DESTINATION_ADDRESS,
    columns::DESTINATION_CITY,
    columns::KM,
    columns::WAITING,
    columns::STATUS,
    columns::TRIP_TYPE,
    columns::CLAIM_NUMBER,
    columns::ART,
    columns::TRANSFER_NUMBER,
    columns::INTERNAL_ID,
    columns::NOTES,
];

/// Write transfers in the same shape the importer reads.
///
/// Fields are never quoted, since the importer splits on every comma.
pub fn write_transfers_csv<W: Write>(
    transfers: &[Transfer],
    drivers: Directory<'_, Driver>,
    companies: Directory<'_, Company>,
    writer: W,
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for transfer in transfers {
        let record = TransferCsvRecord::new(transfer, drivers, companies);
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    log::info!("Exported {} transfers", transfers.len());
    Ok(())
}

#[derive(Serialize)]
struct TransferCsvRecord<'a> {
    date: String,
    time: &'a str,
    patient_name: &'a str,
    patient_phone: &'a str,
    driver_name: &'a str,
    company_name: &'a str,
    origin_address: &'a str,
    origin_city: &'a str,
    destination_address: &'a str,
    destination_city: &'a str,
    km: String,
    waiting: &'static str,
    status: &'static str,
    trip_type: &'static str,
    claim_number: &'a str,
    art: &'a str,
    transfer_number: &'a str,
    internal_id: &'a str,
    notes: &'a str,
}

impl<'a> TransferCsvRecord<'a> {
    fn new(
        transfer: &'a Transfer,
        drivers: Directory<'a, Driver>,
        companies: Directory<'a, Company>,
    ) -> Self {
        let driver_name = drivers.get(&transfer.driver_id).map_or("", |d| d.name.as_str());
        let company_name = companies
            .get(&transfer.company_id)
            .map_or("", |c| c.name.as_str());
        if driver_name.is_empty() || company_name.is_empty() {
            log::warn!(
                "Transfer {} references an unknown driver or company",
                transfer.id
            );
        }
        let record = TransferCsvRecord {
            date: transfer.date.format("%Y-%m-%d").to_string(),
            time: &transfer.time,
            patient_name: &transfer.patient_name,
            patient_phone: &transfer.patient_phone,
            driver_name,
            company_name,
            origin_address: &transfer.origin_address,
            origin_city: &transfer.origin_city,
            destination_address: &transfer.destination_address,
            destination_city: &transfer.destination_city,
            km: transfer.km.normalize().to_string(),
            waiting: if transfer.waiting { "si" } else { "no" },
            status: transfer.status.label(),
            trip_type: transfer.trip_type.label(),
            claim_number: &transfer.claim_number,
            art: &transfer.art,
            transfer_number: &transfer.transfer_number,
            internal_id: &transfer.internal_id,
            notes: &transfer.notes,
        };
        if let Some(field) = record.field_with_comma() {
            log::warn!(
                "Transfer {} has a comma in {}, it will not re-import cleanly",
                transfer.id,
                field
            );
        }
        record
    }

    /// First free-text column whose value would be split on re-import
    fn field_with_comma(&self) -> Option<&'static str> {
        [
            (columns::TIME, self.time),
            (columns::PATIENT, self.patient_name),
            (columns::PATIENT_PHONE, self.patient_phone),
            (columns::DRIVER_NAME, self.driver_name),
            (columns::COMPANY_NAME, self.company_name),
            (columns::ORIGIN_ADDRESS, self.origin_address),
            (columns::ORIGIN_CITY, self.origin_city),
            (columns::DESTINATION_ADDRESS, self.destination_address),
            (columns::DESTINATION_CITY, self.destination_city),
            (columns::CLAIM_NUMBER, self.claim_number),
            (columns::ART, self.art),
            (columns::TRANSFER_NUMBER, self.transfer_number),
            (columns::INTERNAL_ID, self.internal_id),
            (columns::NOTES, self.notes),
        ]
        .into_iter()
        .find(|(_, value)| value.contains(','))
        .map(|(column, _)| column)
    }
}
