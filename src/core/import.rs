//! Bulk import of transfers from the dispatch office's CSV sheets.

use super::directory::{Company, Directory, Driver, Party};
use super::transfer::{default_time, new_transfer_id, Transfer, TransferStatus, TripType};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Column names as they appear in the header row (lower-cased)
pub mod columns {
    pub const DATE: &str = "fecha";
    pub const TIME: &str = "hora";
    pub const PATIENT: &str = "paciente";
    pub const PATIENT_PHONE: &str = "celular_paciente";
    pub const DRIVER_NAME: &str = "chofer_nombre";
    pub const COMPANY_NAME: &str = "empresa_nombre";
    pub const ORIGIN_ADDRESS: &str = "origen_direccion";
    pub const ORIGIN_CITY: &str = "origen_localidad";
    pub const DESTINATION_ADDRESS: &str = "destino_direccion";
    pub const DESTINATION_CITY: &str = "destino_localidad";
    pub const KM: &str = "km";
    pub const WAITING: &str = "espera";
    pub const STATUS: &str = "estado";
    pub const TRIP_TYPE: &str = "tipo_viaje";
    pub const CLAIM_NUMBER: &str = "siniestro";
    pub const ART: &str = "art";
    pub const TRANSFER_NUMBER: &str = "nro_traslado";
    pub const INTERNAL_ID: &str = "id_interno";
    pub const NOTES: &str = "observaciones";
}

/// Columns every import file must carry, in reporting order
pub const REQUIRED_COLUMNS: &[&str] = &[
    columns::DATE,
    columns::PATIENT,
    columns::DRIVER_NAME,
    columns::COMPANY_NAME,
    columns::ORIGIN_ADDRESS,
    columns::DESTINATION_ADDRESS,
];

/// Value of the `espera` column that marks a billable wait
const WAITING_YES: &str = "si";

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

/// A reason an import file or row was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("The file is empty or contains no data rows.")]
    EmptyFile,
    #[error("Missing required columns in the CSV: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Unreadable row: {0}.")]
    Malformed(String),
    #[error("Invalid date (expected format YYYY-MM-DD).")]
    InvalidDate,
    #[error("Missing patient name.")]
    MissingPatient,
    #[error("Driver \"{0}\" not found.")]
    DriverNotFound(String),
    #[error("Company \"{0}\" not found.")]
    CompanyNotFound(String),
    #[error("Invalid km \"{0}\" (expected a non-negative number).")]
    InvalidKm(String),
    #[error("Unknown trip type \"{0}\".")]
    UnknownTripType(String),
}

impl RowError {
    /// Errors that apply to the whole file rather than one row
    pub fn is_structural(&self) -> bool {
        matches!(self, RowError::EmptyFile | RowError::MissingColumns(_))
    }
}

/// A rejected row with every rule it broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRow {
    /// 1-based position among non-blank lines, the header being row 1.
    /// Structural errors use row 0.
    pub row_index: usize,
    /// Cells keyed by header name, in header order
    pub row: Vec<(String, String)>,
    pub errors: Vec<RowError>,
}

impl InvalidRow {
    fn structural(error: RowError) -> Self {
        InvalidRow {
            row_index: 0,
            row: Vec::new(),
            errors: vec![error],
        }
    }

    /// All error messages joined into one line
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of an import: valid transfers ready to persist, and rejected rows
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub valid: Vec<Transfer>,
    pub invalid: Vec<InvalidRow>,
}

/// One data row, typed. `None` means the cell was blank or the column absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRecord {
    pub date: Option<String>,
    /// Defaults to `00:00`
    pub time: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub driver_name: Option<String>,
    pub company_name: Option<String>,
    pub origin_address: Option<String>,
    pub origin_city: Option<String>,
    pub destination_address: Option<String>,
    pub destination_city: Option<String>,
    /// Defaults to 0
    pub km: Option<String>,
    /// Only `si` (any case) sets the waiting flag
    pub waiting: Option<String>,
    /// Only `Anulado` voids; anything else is completed
    pub status: Option<String>,
    /// Defaults to round-trip
    pub trip_type: Option<String>,
    pub claim_number: Option<String>,
    pub art: Option<String>,
    pub transfer_number: Option<String>,
    pub internal_id: Option<String>,
    pub notes: Option<String>,
}

impl TransferRecord {
    fn from_cells(cells: &HashMap<&str, &str>) -> Self {
        let cell = |name: &str| {
            cells
                .get(name)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };
        TransferRecord {
            date: cell(columns::DATE),
            time: cell(columns::TIME),
            patient_name: cell(columns::PATIENT),
            patient_phone: cell(columns::PATIENT_PHONE),
            driver_name: cell(columns::DRIVER_NAME),
            company_name: cell(columns::COMPANY_NAME),
            origin_address: cell(columns::ORIGIN_ADDRESS),
            origin_city: cell(columns::ORIGIN_CITY),
            destination_address: cell(columns::DESTINATION_ADDRESS),
            destination_city: cell(columns::DESTINATION_CITY),
            km: cell(columns::KM),
            waiting: cell(columns::WAITING),
            status: cell(columns::STATUS),
            trip_type: cell(columns::TRIP_TYPE),
            claim_number: cell(columns::CLAIM_NUMBER),
            art: cell(columns::ART),
            transfer_number: cell(columns::TRANSFER_NUMBER),
            internal_id: cell(columns::INTERNAL_ID),
            notes: cell(columns::NOTES),
        }
    }

    /// Check every rule and build the transfer, or report all violations.
    pub fn into_transfer(
        self,
        drivers: Directory<'_, Driver>,
        companies: Directory<'_, Company>,
    ) -> Result<Transfer, Vec<RowError>> {
        let mut errors = Vec::new();

        let date = self.date.as_deref().and_then(parse_date);
        if date.is_none() {
            errors.push(RowError::InvalidDate);
        }

        if self.patient_name.is_none() {
            errors.push(RowError::MissingPatient);
        }

        let driver_name = self.driver_name.clone().unwrap_or_default();
        let driver = drivers.find_by_name(&driver_name);
        if driver.is_none() {
            errors.push(RowError::DriverNotFound(driver_name));
        }

        let company_name = self.company_name.clone().unwrap_or_default();
        let company = companies.find_by_name(&company_name);
        if company.is_none() {
            errors.push(RowError::CompanyNotFound(company_name));
        }

        let km = match self.km.as_deref() {
            None => Some(Decimal::ZERO),
            Some(raw) => raw
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(raw))
                .ok()
                .filter(|km| !km.is_sign_negative()),
        };
        if km.is_none() {
            errors.push(RowError::InvalidKm(self.km.clone().unwrap_or_default()));
        }

        let trip_type = match self.trip_type.as_deref() {
            None => Some(TripType::RoundTrip),
            Some(raw) => TripType::parse(raw),
        };
        if trip_type.is_none() {
            errors.push(RowError::UnknownTripType(
                self.trip_type.clone().unwrap_or_default(),
            ));
        }

        let (Some(date), Some(patient_name), Some(driver), Some(company), Some(km), Some(trip_type)) =
            (date, self.patient_name, driver, company, km, trip_type)
        else {
            return Err(errors);
        };

        Ok(Transfer {
            id: new_transfer_id(),
            internal_id: self.internal_id.unwrap_or_default(),
            transfer_number: self.transfer_number.unwrap_or_default(),
            claim_number: self.claim_number.unwrap_or_default(),
            art: self.art.unwrap_or_default(),
            date,
            time: self.time.unwrap_or_else(default_time),
            patient_name,
            patient_phone: self.patient_phone.unwrap_or_default(),
            driver_id: driver.id().to_string(),
            company_id: company.id().to_string(),
            origin_address: self.origin_address.unwrap_or_default(),
            origin_city: self.origin_city.unwrap_or_default(),
            destination_address: self.destination_address.unwrap_or_default(),
            destination_city: self.destination_city.unwrap_or_default(),
            km,
            trip_type,
            waiting: self
                .waiting
                .is_some_and(|w| w.to_lowercase() == WAITING_YES),
            status: self
                .status
                .as_deref()
                .map_or(TransferStatus::Completed, TransferStatus::parse),
            notes: self.notes.unwrap_or_default(),
        })
    }
}

/// Dates must be literally `YYYY-MM-DD` and name a real calendar day
fn parse_date(s: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse CSV text into valid transfers and rejected rows.
///
/// Lines end at `\r\n` or `\n`. Fields are split positionally on commas;
/// quoting is not interpreted. Blank lines are skipped anywhere in the file. Rows are validated
/// independently and both outputs keep source order.
pub fn import_transfers(
    text: &str,
    drivers: Directory<'_, Driver>,
    companies: Directory<'_, Company>,
) -> ImportResult {
    let mut result = ImportResult::default();

    // Only `\r\n` and `\n` end a line; a lone `\r` stays inside its cell.
    let text = text.replace("\r\n", "\n");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(text.as_bytes());

    let lines: Vec<Result<csv::StringRecord, csv::Error>> = rdr
        .records()
        .filter(|record| match record {
            Ok(r) => !is_blank(r),
            Err(_) => true,
        })
        .collect();

    if lines.len() < 2 {
        result.invalid.push(InvalidRow::structural(RowError::EmptyFile));
        return result;
    }

    let headers: Vec<String> = match &lines[0] {
        Ok(header) => header.iter().map(|h| h.to_lowercase()).collect(),
        Err(err) => {
            result
                .invalid
                .push(InvalidRow::structural(RowError::Malformed(err.to_string())));
            return result;
        }
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        log::warn!("Import file is missing columns: {}", missing.join(", "));
        result
            .invalid
            .push(InvalidRow::structural(RowError::MissingColumns(missing)));
        return result;
    }

    for (i, line) in lines.iter().enumerate().skip(1) {
        let row_index = i + 1;
        let record = match line {
            Ok(record) => record,
            Err(err) => {
                result.invalid.push(InvalidRow {
                    row_index,
                    row: Vec::new(),
                    errors: vec![RowError::Malformed(err.to_string())],
                });
                continue;
            }
        };

        let row: Vec<(String, String)> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
            .collect();
        let cells: HashMap<&str, &str> = row
            .iter()
            .map(|(header, value)| (header.as_str(), value.as_str()))
            .collect();

        match TransferRecord::from_cells(&cells).into_transfer(drivers, companies) {
            Ok(transfer) => result.valid.push(transfer),
            Err(errors) => {
                log::debug!("Row {} rejected: {:?}", row_index, errors);
                result.invalid.push(InvalidRow {
                    row_index,
                    row,
                    errors,
                });
            }
        }
    }

    log::info!(
        "Imported {} valid and {} invalid rows",
        result.valid.len(),
        result.invalid.len()
    );
    result
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(str::is_empty) && record.len() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory::Rates;
    use crate::core::export::write_transfers_csv;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "fecha,hora,paciente,chofer_nombre,empresa_nombre,origen_direccion,destino_direccion,km,espera,estado,tipo_viaje";

    fn drivers() -> Vec<Driver> {
        vec![Driver {
            id: "d1".to_string(),
            name: "Juan Perez".to_string(),
            dni: String::new(),
            phone: String::new(),
            email: String::new(),
            license_expiry: None,
            rates: Rates::default(),
        }]
    }

    fn companies() -> Vec<Company> {
        vec![Company {
            id: "c1".to_string(),
            name: "ACME".to_string(),
            cuit: String::new(),
            email: String::new(),
            contact: String::new(),
            rates: Rates::default(),
        }]
    }

    fn run(text: &str) -> ImportResult {
        let drivers = drivers();
        let companies = companies();
        import_transfers(text, Directory::new(&drivers), Directory::new(&companies))
    }

    #[test]
    fn valid_row_becomes_transfer() {
        let text = format!(
            "{HEADER}\n2024-05-02,09:30,Ana Gomez,juan perez,acme,Belgrano 100,Hospital Central,12.5,SI,Realizado,IDA"
        );
        let result = run(&text);

        assert!(result.invalid.is_empty());
        assert_eq!(result.valid.len(), 1);
        let t = &result.valid[0];
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(t.time, "09:30");
        assert_eq!(t.patient_name, "Ana Gomez");
        assert_eq!(t.driver_id, "d1");
        assert_eq!(t.company_id, "c1");
        assert_eq!(t.km, dec!(12.5));
        assert!(t.waiting);
        assert_eq!(t.status, TransferStatus::Completed);
        assert_eq!(t.trip_type, TripType::OneWay);
        assert!(t.id.starts_with("trans_"));
    }

    #[test]
    fn blank_optional_cells_take_defaults() {
        let text = "fecha,paciente,chofer_nombre,empresa_nombre,origen_direccion,destino_direccion\n\
                    2024-05-02,Ana Gomez,Juan Perez,ACME,Belgrano 100,Hospital Central";
        let result = run(text);

        let t = &result.valid[0];
        assert_eq!(t.time, "00:00");
        assert_eq!(t.km, Decimal::ZERO);
        assert!(!t.waiting);
        assert_eq!(t.status, TransferStatus::Completed);
        assert_eq!(t.trip_type, TripType::RoundTrip);
        assert_eq!(t.origin_city, "");
        assert_eq!(t.notes, "");
    }

    #[test]
    fn missing_trailing_cells_are_empty() {
        let text = format!("{HEADER}\n2024-05-02,,Ana Gomez,Juan Perez,ACME,Belgrano 100,Hospital Central");
        let result = run(&text);
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].km, Decimal::ZERO);
    }

    #[test]
    fn lone_carriage_return_stays_in_its_cell() {
        let text = format!(
            "{HEADER},observaciones\r\n\
             2024-05-02,09:30,Ana Gomez,Juan Perez,ACME,Belgrano 100,Hospital Central,5,no,,IDA,silla\rde ruedas\r\n\
             2024-05-03,09:30,Ana Gomez,Juan Perez,ACME,Belgrano 100,Hospital Central,5,no,,IDA,"
        );
        let result = run(&text);

        assert!(result.invalid.is_empty(), "{:?}", result.invalid);
        assert_eq!(result.valid.len(), 2);
        assert_eq!(result.valid[0].notes, "silla\rde ruedas");
    }

    #[test]
    fn km_accepts_exponent_notation() {
        let text = format!(
            "{HEADER}\n2024-05-02,,Ana Gomez,Juan Perez,ACME,Belgrano 100,Hospital Central,1e2"
        );
        let result = run(&text);
        assert!(result.invalid.is_empty(), "{:?}", result.invalid);
        assert_eq!(result.valid[0].km, dec!(100));
    }

    #[test]
    fn fewer_than_two_lines_is_empty_file() {
        for text in ["", "\n\n", HEADER, "\r\n   \r\nfecha,paciente\n"] {
            let result = run(text);
            assert!(result.valid.is_empty());
            assert_eq!(result.invalid.len(), 1);
            assert_eq!(result.invalid[0].errors, vec![RowError::EmptyFile]);
            assert_eq!(result.invalid[0].row_index, 0);
        }
    }

    #[test]
    fn missing_columns_reported_in_required_order() {
        let text = "Destino_Direccion,PACIENTE,km\n2024-05-02,Ana,3";
        let result = run(text);

        assert!(result.valid.is_empty());
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(
            result.invalid[0].errors,
            vec![RowError::MissingColumns(vec![
                "fecha".to_string(),
                "chofer_nombre".to_string(),
                "empresa_nombre".to_string(),
                "origen_direccion".to_string(),
            ])]
        );
        assert!(result.invalid[0].errors[0].is_structural());
        assert_eq!(
            result.invalid[0].message(),
            "Missing required columns in the CSV: fecha, chofer_nombre, empresa_nombre, origen_direccion"
        );
    }

    #[test]
    fn all_row_errors_are_combined() {
        let text = format!("{HEADER}\n02/05/2024,09:30,,Pedro,Globex,Belgrano 100,Hospital Central");
        let result = run(&text);

        assert!(result.valid.is_empty());
        let invalid = &result.invalid[0];
        assert_eq!(invalid.row_index, 2);
        assert_eq!(
            invalid.errors,
            vec![
                RowError::InvalidDate,
                RowError::MissingPatient,
                RowError::DriverNotFound("Pedro".to_string()),
                RowError::CompanyNotFound("Globex".to_string()),
            ]
        );
        assert_eq!(
            invalid.message(),
            "Invalid date (expected format YYYY-MM-DD). Missing patient name. \
             Driver \"Pedro\" not found. Company \"Globex\" not found."
        );
        assert!(invalid.row.contains(&("chofer_nombre".to_string(), "Pedro".to_string())));
    }

    #[test]
    fn unknown_driver_error_quotes_cell_value() {
        let text = format!("{HEADER}\n2024-05-02,,Ana,Juan  Pérez,ACME,a,b");
        let result = run(&text);
        assert!(result.invalid[0].message().contains("\"Juan  Pérez\""));
    }

    #[test]
    fn date_must_match_pattern_and_calendar() {
        for date in ["2024-5-02", "24-05-02", "2024-05-02T10:00", "2024-02-30"] {
            let text = format!("{HEADER}\n{date},,Ana,Juan Perez,ACME,a,b");
            let result = run(&text);
            assert_eq!(result.invalid[0].errors, vec![RowError::InvalidDate], "{date}");
        }
    }

    #[test]
    fn unparsable_or_negative_km_rejected() {
        for km in ["doce", "-3", "12km"] {
            let text = format!("{HEADER}\n2024-05-02,,Ana,Juan Perez,ACME,a,b,{km}");
            let result = run(&text);
            assert_eq!(
                result.invalid[0].errors,
                vec![RowError::InvalidKm(km.to_string())]
            );
        }
    }

    #[test]
    fn unknown_trip_type_rejected() {
        let text = format!("{HEADER}\n2024-05-02,,Ana,Juan Perez,ACME,a,b,,,,VUELTA");
        let result = run(&text);
        assert_eq!(
            result.invalid[0].errors,
            vec![RowError::UnknownTripType("VUELTA".to_string())]
        );
    }

    #[test]
    fn status_and_waiting_flags() {
        let text = format!(
            "{HEADER}\n\
             2024-05-02,,A,Juan Perez,ACME,a,b,,no,Anulado,\n\
             2024-05-02,,B,Juan Perez,ACME,a,b,,Si,anulado,\n\
             2024-05-02,,C,Juan Perez,ACME,a,b,,sí,,"
        );
        let result = run(&text);

        let flags: Vec<_> = result
            .valid
            .iter()
            .map(|t| (t.waiting, t.status))
            .collect();
        assert_eq!(
            flags,
            vec![
                (false, TransferStatus::Voided),
                (true, TransferStatus::Completed),
                (false, TransferStatus::Completed),
            ]
        );
    }

    #[test]
    fn rows_are_independent_and_ordered() {
        let text = format!(
            "{HEADER}\r\n\
             2024-05-01,,First,Juan Perez,ACME,a,b\r\n\
             \r\n\
             2024-05-02,,Second,Nobody,ACME,a,b\r\n\
             2024-05-03,,Third,Juan Perez,ACME,a,b\r\n\
             bad-date,,Fourth,Juan Perez,ACME,a,b\r\n"
        );
        let result = run(&text);

        let names: Vec<_> = result.valid.iter().map(|t| t.patient_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);

        let rows: Vec<_> = result.invalid.iter().map(|r| r.row_index).collect();
        assert_eq!(rows, vec![3, 5]);
        assert_ne!(result.valid[0].id, result.valid[1].id);
    }

    #[test]
    fn header_is_trimmed_and_lower_cased() {
        let text = " FECHA , Paciente,CHOFER_NOMBRE,Empresa_Nombre, origen_direccion ,DESTINO_DIRECCION\n\
                    2024-05-02, Ana Gomez ,Juan Perez,ACME,Belgrano 100,Hospital Central";
        let result = run(text);
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].patient_name, "Ana Gomez");
    }

    #[test]
    fn quotes_are_not_interpreted() {
        let text = format!("{HEADER}\n2024-05-02,,\"Gomez, Ana\",Juan Perez,ACME,a,b");
        let result = run(&text);
        // the quoted comma splits the patient cell, shifting the driver column
        assert!(result.valid.is_empty());
        assert_eq!(
            result.invalid[0].errors,
            vec![
                RowError::DriverNotFound("Ana\"".to_string()),
                RowError::CompanyNotFound("Juan Perez".to_string()),
                RowError::InvalidKm("b".to_string()),
            ]
        );
    }

    #[test]
    fn reimporting_exported_rows_gives_same_partition() {
        let text = "fecha,hora,paciente,celular_paciente,chofer_nombre,empresa_nombre,origen_direccion,\
             origen_localidad,destino_direccion,destino_localidad,km,espera,estado,tipo_viaje,siniestro,\
             art,nro_traslado,id_interno,observaciones\n\
             2024-05-01,08:15,Ana Gomez,341555,Juan Perez,ACME,Belgrano 100,Rosario,Hospital Central,Rosario,12.5,si,Realizado,IDA Y VUELTA,S-1,ART9,T-1,I-1,silla de ruedas\n\
             2024-05-02,,Luis Diaz,,Juan Perez,ACME,Mitre 5,Funes,Clinica Sur,Rosario,80,,Anulado,IDA,,,,,\n\
             2024-05-03,,Eva Ruiz,,Juan Perez,ACME,Oroño 20,Rosario,Sanatorio,Rosario,3,no,,IDA MULTIPLE,,,,,";
        let drivers = drivers();
        let companies = companies();
        let first = import_transfers(text, Directory::new(&drivers), Directory::new(&companies));
        assert_eq!(first.valid.len(), 3);

        let mut exported = Vec::new();
        write_transfers_csv(
            &first.valid,
            Directory::new(&drivers),
            Directory::new(&companies),
            &mut exported,
        )
        .unwrap();
        let exported = String::from_utf8(exported).unwrap();

        let second = import_transfers(&exported, Directory::new(&drivers), Directory::new(&companies));
        assert!(second.invalid.is_empty());

        let strip_ids = |transfers: Vec<Transfer>| {
            transfers
                .into_iter()
                .map(|t| Transfer {
                    id: String::new(),
                    ..t
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(strip_ids(second.valid), strip_ids(first.valid));
    }
}
