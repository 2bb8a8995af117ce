//! CSV loader for historical service records
//!
//! Expected header (order free, case-insensitive):
//! vehicle,service_type,mileage,date[,notes]
//!
//! `vehicle` is a vehicle id or a plate; resolving it is up to the caller.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use upkeep_types::ServiceType;

#[derive(Error, Debug)]
pub enum CsvImportError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Empty {column} in row {row}")]
    EmptyField { row: usize, column: String },

    #[error("Invalid mileage in row {row}: {value}")]
    InvalidMileage { row: usize, value: String },

    #[error("Invalid date format in row {row}: {value}")]
    InvalidDate { row: usize, value: String },
}

impl From<CsvImportError> for upkeep_types::Error {
    fn from(err: CsvImportError) -> Self {
        upkeep_types::Error::Import(err.to_string())
    }
}

/// One parsed row of a service history file
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceImportRow {
    /// 1-based line number in the file, header is line 1
    pub row: usize,
    pub vehicle: String,
    pub service_type: ServiceType,
    pub mileage: u64,
    pub performed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

struct Columns {
    vehicle: usize,
    service_type: usize,
    mileage: usize,
    date: usize,
    notes: Option<usize>,
}

/// Load service history rows from a CSV file
pub fn load_service_history<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ServiceImportRow>, CsvImportError> {
    let file = File::open(path)?;
    parse_service_history(file)
}

/// Parse service history rows from any reader
pub fn parse_service_history<R: Read>(reader: R) -> Result<Vec<ServiceImportRow>, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = locate_columns(&headers)?;

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row_num = row_idx + 2; // +2 because row_idx is 0-based and header is row 1
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(parse_record(&record, &columns, row_num)?);
    }

    Ok(rows)
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, CsvImportError> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| CsvImportError::MissingColumn(names[0].to_string()))
    };

    Ok(Columns {
        vehicle: require(&["vehicle", "vehicle_id", "plate"])?,
        service_type: require(&["service_type", "service"])?,
        mileage: require(&["mileage", "mileage_at_service", "odometer"])?,
        date: require(&["date", "performed_at"])?,
        notes: find(&["notes"]),
    })
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &Columns,
    row_num: usize,
) -> Result<ServiceImportRow, CsvImportError> {
    let field = |index: usize, column: &str| {
        let value = record.get(index).unwrap_or("");
        if value.is_empty() {
            Err(CsvImportError::EmptyField {
                row: row_num,
                column: column.to_string(),
            })
        } else {
            Ok(value)
        }
    };

    let vehicle = field(columns.vehicle, "vehicle")?.to_string();
    let service_type = ServiceType::parse(field(columns.service_type, "service_type")?);

    let mileage_str = field(columns.mileage, "mileage")?;
    let mileage = parse_mileage(mileage_str).ok_or_else(|| CsvImportError::InvalidMileage {
        row: row_num,
        value: mileage_str.to_string(),
    })?;

    let date_str = field(columns.date, "date")?;
    let performed_at = parse_date(date_str).ok_or_else(|| CsvImportError::InvalidDate {
        row: row_num,
        value: date_str.to_string(),
    })?;

    let notes = columns
        .notes
        .and_then(|index| record.get(index))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ServiceImportRow {
        row: row_num,
        vehicle,
        service_type,
        mileage,
        performed_at,
        notes,
    })
}

/// Accepts thousands separators ("12,500" when quoted, "12 500", "12_500")
fn parse_mileage(s: &str) -> Option<u64> {
    let digits: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    digits.parse().ok()
}

/// Parse RFC 3339 or a plain date (YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY)
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_rows() {
        let csv = "Vehicle,Service_Type,Mileage,Date,Notes\n\
                   B 7001 VAN,Oil Change,4600,2024-03-01,Shell 10W-40\n\
                   B 7001 VAN,Brake Service,\"9,950\",2024/05/12,\n\
                   veh_42,major_service,40100,2024-06-30T08:15:00Z,\n";
        let rows = parse_service_history(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].service_type, ServiceType::OilChange);
        assert_eq!(rows[0].notes.as_deref(), Some("Shell 10W-40"));
        assert_eq!(rows[1].service_type, ServiceType::BrakeCheck);
        assert_eq!(rows[1].mileage, 9_950);
        assert_eq!(rows[1].notes, None);
        assert_eq!(rows[2].vehicle, "veh_42");
        assert_eq!(rows[2].row, 4);
    }

    #[test]
    fn test_missing_column() {
        let csv = "vehicle,service_type,date\nveh_1,oil_change,2024-01-01\n";
        let err = parse_service_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::MissingColumn(ref c) if c == "mileage"));
    }

    #[test]
    fn test_bad_mileage_reports_row() {
        let csv = "vehicle,service_type,mileage,date\n\
                   veh_1,oil_change,4600,2024-01-01\n\
                   veh_1,oil_change,lots,2024-02-01\n";
        let err = parse_service_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::InvalidMileage { row: 3, .. }));
    }

    #[test]
    fn test_bad_date_reports_row() {
        let csv = "vehicle,service_type,mileage,date\nveh_1,oil_change,4600,yesterday\n";
        let err = parse_service_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"plate,service,odometer,performed_at\nB 1 CAR,Air Filter / Tune Up,15000,2024-01-05\n")
            .unwrap();
        let rows = load_service_history(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].service_type, ServiceType::AirFilter);
        assert_eq!(rows[0].mileage, 15_000);
    }
}
