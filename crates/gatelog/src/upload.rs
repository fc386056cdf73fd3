//! CSV upload validation and conversion.
//!
//! An upload must contain the full required column set; extra columns are
//! tolerated and ignored. Validation happens before any row conversion, and
//! any malformed cell aborts the whole upload, so nothing is ever partially
//! written.

use std::io::Read;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reading::SensorReading;

/// The column set every upload must provide.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "ts",
    "hp_mass_flow",
    "lp_mass_flow",
    "grs_mass_flow",
    "hp_pressure",
    "lp_pressure",
];

/// The required columns absent from `headers`, in declaration order.
#[must_use]
pub fn missing_columns(headers: &StringRecord) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .map(|&required| required.to_string())
        .collect()
}

/// Resolved positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    ts: usize,
    hp_mass_flow: usize,
    lp_mass_flow: usize,
    grs_mass_flow: usize,
    hp_pressure: usize,
    lp_pressure: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let missing = missing_columns(headers);
        if !missing.is_empty() {
            return Err(Error::MissingColumns { missing });
        }

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .unwrap_or_default() // unreachable: presence checked above
        };

        Ok(Self {
            ts: position("ts"),
            hp_mass_flow: position("hp_mass_flow"),
            lp_mass_flow: position("lp_mass_flow"),
            grs_mass_flow: position("grs_mass_flow"),
            hp_pressure: position("hp_pressure"),
            lp_pressure: position("lp_pressure"),
        })
    }

    fn to_reading(self, record: &StringRecord, line: u64) -> Result<SensorReading> {
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        Ok(SensorReading {
            ts: parse_timestamp(cell(self.ts), line)?,
            hp_mass_flow: parse_number("hp_mass_flow", cell(self.hp_mass_flow), line)?,
            lp_mass_flow: parse_number("lp_mass_flow", cell(self.lp_mass_flow), line)?,
            grs_mass_flow: parse_number("grs_mass_flow", cell(self.grs_mass_flow), line)?,
            hp_pressure: parse_number("hp_pressure", cell(self.hp_pressure), line)?,
            lp_pressure: parse_number("lp_pressure", cell(self.lp_pressure), line)?,
            hp_enthalpy: None,
            lp_enthalpy: None,
            inlet_energy: None,
        })
    }
}

/// Read and validate an uploaded CSV into typed readings.
///
/// Validates the header row first, then converts every row; derived fields
/// are left unset for the batch processor.
///
/// # Errors
///
/// Returns [`Error::MissingColumns`] when the header lacks required
/// columns, and a cell-level error (with line number) for any value that
/// fails to parse. No partial result is ever returned.
pub fn read_readings<R: Read>(reader: R) -> Result<Vec<SensorReading>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut readings = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Header occupies line 1.
        let line = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(2);
        readings.push(columns.to_reading(&record, line)?);
    }

    debug!("Parsed {} readings from upload", readings.len());
    Ok(readings)
}

/// Parse a timestamp cell.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, and
/// `YYYY-MM-DDTHH:MM:SS[.fff]`; naive values are taken as UTC.
fn parse_timestamp(value: &str, line: u64) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(Error::InvalidTimestamp {
        value: value.to_string(),
        line,
    })
}

/// Parse a numeric cell.
fn parse_number(column: &str, value: &str, line: u64) -> Result<f64> {
    value.parse::<f64>().map_err(|_| Error::InvalidNumber {
        column: column.to_string(),
        value: value.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const VALID_CSV: &str = "\
ts,hp_mass_flow,lp_mass_flow,grs_mass_flow,hp_pressure,lp_pressure
2024-01-15 00:00:00,2.0,3.0,1.0,5.0,4.0
2024-01-15 01:00:00,2.5,3.5,1.5,5.5,4.5
";

    #[test]
    fn test_read_valid_csv() {
        let readings = read_readings(VALID_CSV.as_bytes()).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(
            readings[0].ts,
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert!((readings[0].hp_mass_flow - 2.0).abs() < f64::EPSILON);
        assert!((readings[1].lp_pressure - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_derived_fields_start_unset() {
        let readings = read_readings(VALID_CSV.as_bytes()).unwrap();

        for r in &readings {
            assert!(r.hp_enthalpy.is_none());
            assert!(r.lp_enthalpy.is_none());
            assert!(r.inlet_energy.is_none());
            assert!(!r.is_processed());
        }
    }

    #[test]
    fn test_extra_columns_tolerated() {
        let csv = "\
ts,hp_mass_flow,lp_mass_flow,grs_mass_flow,hp_pressure,lp_pressure,operator_note
2024-01-15 00:00:00,2.0,3.0,1.0,5.0,4.0,night shift
";
        let readings = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "\
lp_pressure,ts,hp_pressure,grs_mass_flow,lp_mass_flow,hp_mass_flow
4.0,2024-01-15 00:00:00,5.0,1.0,3.0,2.0
";
        let readings = read_readings(csv.as_bytes()).unwrap();
        assert!((readings[0].hp_mass_flow - 2.0).abs() < f64::EPSILON);
        assert!((readings[0].lp_pressure - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_columns_reported_exactly() {
        let csv = "\
ts,hp_mass_flow,lp_mass_flow
2024-01-15 00:00:00,2.0,3.0
";
        let err = read_readings(csv.as_bytes()).unwrap_err();

        match err {
            Error::MissingColumns { missing } => {
                assert_eq!(missing, vec!["grs_mass_flow", "hp_pressure", "lp_pressure"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_reports_all_columns_missing() {
        let err = read_readings("".as_bytes()).unwrap_err();

        match err {
            Error::MissingColumns { missing } => {
                assert_eq!(missing.len(), REQUIRED_COLUMNS.len());
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let csv = "ts,hp_mass_flow,lp_mass_flow,grs_mass_flow,hp_pressure,lp_pressure\n";
        let readings = read_readings(csv.as_bytes()).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_bad_number_names_column_and_line() {
        let csv = "\
ts,hp_mass_flow,lp_mass_flow,grs_mass_flow,hp_pressure,lp_pressure
2024-01-15 00:00:00,2.0,3.0,1.0,5.0,4.0
2024-01-15 01:00:00,oops,3.0,1.0,5.0,4.0
";
        let err = read_readings(csv.as_bytes()).unwrap_err();

        match err {
            Error::InvalidNumber { column, value, line } => {
                assert_eq!(column, "hp_mass_flow");
                assert_eq!(value, "oops");
                assert_eq!(line, 3);
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let csv = "\
ts,hp_mass_flow,lp_mass_flow,grs_mass_flow,hp_pressure,lp_pressure
yesterday,2.0,3.0,1.0,5.0,4.0
";
        let err = read_readings(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { line: 2, .. }));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap();

        assert_eq!(
            parse_timestamp("2024-01-15T12:30:00Z", 2).unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp("2024-01-15 12:30:00", 2).unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp("2024-01-15T12:30:00", 2).unwrap(),
            expected
        );
        // Offsets are normalized to UTC.
        assert_eq!(
            parse_timestamp("2024-01-15T14:30:00+02:00", 2).unwrap(),
            expected
        );
    }

    #[test]
    fn test_fractional_seconds() {
        let parsed = parse_timestamp("2024-01-15 12:30:00.500", 2).unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap()
                + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_missing_columns_helper() {
        let headers = StringRecord::from(vec!["ts", "hp_pressure"]);
        let missing = missing_columns(&headers);
        assert_eq!(
            missing,
            vec!["hp_mass_flow", "lp_mass_flow", "grs_mass_flow", "lp_pressure"]
        );
    }

    #[test]
    fn test_full_headers_have_no_missing_columns() {
        let headers = StringRecord::from(REQUIRED_COLUMNS.to_vec());
        assert!(missing_columns(&headers).is_empty());
    }
}
