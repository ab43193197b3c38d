//! CSV ingest and normalization.
//!
//! This module turns the OWID CSV into a typed [`Dataset`]:
//! - **Strict schema** for the columns the statistics engine reads
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No coercion**: empty or unparseable numeric cells become `None`, never zero

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use log::{debug, warn};

use crate::domain::{Dataset, Observation, RowError};
use crate::error::AppError;

/// Columns the statistics engine depends on.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "location",
    "date",
    "new_cases",
    "new_deaths",
    "total_vaccinations",
    "people_vaccinated",
    "people_fully_vaccinated",
    "population",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read a dataset from a local CSV file.
pub fn load_dataset_file(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data_unavailable(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    parse_dataset(file)
}

/// Parse a dataset from any CSV byte stream with a header row.
pub fn parse_dataset<R: Read>(source: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_unavailable(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;
    let columns = Columns::resolve(&header_map)?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        let first = &row_errors[0];
        warn!(
            "skipped {} malformed row(s); first at line {}: {}",
            row_errors.len(),
            first.line,
            first.message
        );
    }

    if rows.is_empty() {
        return Err(AppError::data_unavailable(
            "No valid rows in the dataset after parsing.",
        ));
    }

    debug!("parsed {} of {} rows", rows.len(), rows_read);

    Ok(Dataset {
        rows,
        rows_read,
        row_errors,
    })
}

/// Column indices for the fields we read.
struct Columns {
    location: usize,
    date: usize,
    new_cases: usize,
    new_deaths: usize,
    total_vaccinations: usize,
    people_vaccinated: usize,
    people_fully_vaccinated: usize,
    population: usize,
}

impl Columns {
    fn resolve(header_map: &HashMap<String, usize>) -> Result<Self, AppError> {
        let idx = |name: &str| {
            header_map
                .get(name)
                .copied()
                .ok_or_else(|| AppError::data_unavailable(format!("Missing required column: `{name}`")))
        };
        Ok(Self {
            location: idx("location")?,
            date: idx("date")?,
            new_cases: idx("new_cases")?,
            new_deaths: idx("new_deaths")?,
            total_vaccinations: idx("total_vaccinations")?,
            people_vaccinated: idx("people_vaccinated")?,
            people_fully_vaccinated: idx("people_fully_vaccinated")?,
            population: idx("population")?,
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // UTF-8 exports sometimes carry a BOM on the first header; without
    // stripping it, `location` would be reported missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::data_unavailable(format!(
        "Missing required column(s): {}",
        missing
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<Observation, String> {
    let location = get_required(record, columns.location, "location")?.to_string();
    let date = parse_date(get_required(record, columns.date, "date")?)?;

    Ok(Observation {
        location,
        date,
        new_cases: parse_opt_f64(get_optional(record, columns.new_cases)),
        new_deaths: parse_opt_f64(get_optional(record, columns.new_deaths)),
        total_vaccinations: parse_opt_f64(get_optional(record, columns.total_vaccinations)),
        people_vaccinated: parse_opt_f64(get_optional(record, columns.people_vaccinated)),
        people_fully_vaccinated: parse_opt_f64(get_optional(
            record,
            columns.people_fully_vaccinated,
        )),
        population: parse_opt_f64(get_optional(record, columns.population)),
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    get_optional(record, idx).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const HEADER: &str = "iso_code,location,date,new_cases,new_deaths,total_vaccinations,people_vaccinated,people_fully_vaccinated,population";

    fn csv(lines: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for l in lines {
            out.push('\n');
            out.push_str(l);
        }
        out.push('\n');
        out
    }

    #[test]
    fn parses_rows_and_keeps_missing_values() {
        let data = csv(&[
            "DEU,Germany,2021-01-01,100.0,2.0,,,,83000000",
            "DEU,Germany,2021-01-02,0.0,,500,400,100,83000000",
        ]);
        let ds = parse_dataset(data.as_bytes()).unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows_read, 2);

        let first = &ds.rows[0];
        assert_eq!(first.location, "Germany");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(first.new_cases, Some(100.0));
        assert_eq!(first.total_vaccinations, None);
        assert_eq!(first.population, Some(83_000_000.0));

        let second = &ds.rows[1];
        assert_eq!(second.new_cases, Some(0.0));
        assert_eq!(second.new_deaths, None);
        assert_eq!(second.people_fully_vaccinated, Some(100.0));
    }

    #[test]
    fn skips_rows_with_bad_dates() {
        let data = csv(&[
            "DEU,Germany,01/02/2021,1,1,,,,10",
            "DEU,Germany,2021-01-02,1,1,,,,10",
            "DEU,,2021-01-03,1,1,,,,10",
        ]);
        let ds = parse_dataset(data.as_bytes()).unwrap();
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.row_errors.len(), 2);
        assert_eq!(ds.row_errors[0].line, 2);
        assert!(ds.row_errors[0].message.contains("Invalid date"));
        assert!(ds.row_errors[1].message.contains("location"));
    }

    #[test]
    fn missing_column_is_data_unavailable() {
        let data = "location,date,new_cases\nGermany,2021-01-01,1\n";
        let err = parse_dataset(data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert!(err.to_string().contains("`new_deaths`"));
    }

    #[test]
    fn header_bom_and_case_are_normalized() {
        let data = "\u{feff}Location,DATE,new_cases,new_deaths,total_vaccinations,people_vaccinated,people_fully_vaccinated,population\nMalta,2021-05-01,3,,,,,500000\n";
        let ds = parse_dataset(data.as_bytes()).unwrap();
        assert_eq!(ds.rows[0].location, "Malta");
        assert_eq!(ds.rows[0].new_cases, Some(3.0));
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let err = parse_dataset(csv(&[]).as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }

    #[test]
    fn non_finite_numbers_are_no_data() {
        assert_eq!(parse_opt_f64(Some("NaN")), None);
        assert_eq!(parse_opt_f64(Some("inf")), None);
        assert_eq!(parse_opt_f64(Some("abc")), None);
        assert_eq!(parse_opt_f64(Some("12.5")), Some(12.5));
    }
}
