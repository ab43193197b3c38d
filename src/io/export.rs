//! Export one country's derived series to JSON or CSV.
//!
//! Every series is aligned to the country's date axis. "No data" is written
//! as `null` (JSON) or an empty cell (CSV), never as `0`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Metric;
use crate::error::AppError;
use crate::stats::{CountrySummary, CountryView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Guess from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

#[derive(Debug, Serialize)]
struct CountryExport {
    tool: &'static str,
    summary: CountrySummary,
    dates: Vec<NaiveDate>,
    series: BTreeMap<&'static str, Vec<Option<f64>>>,
}

fn aligned_series(view: &CountryView) -> Vec<(Metric, Vec<Option<f64>>)> {
    Metric::ALL
        .iter()
        .map(|&m| (m, view.metric(m).aligned_to(view.dates()).values().to_vec()))
        .collect()
}

/// Write a country export file in the given format.
pub fn export_country(path: &Path, view: &CountryView, format: ExportFormat) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create export file '{}': {e}", path.display()))
    })?;
    match format {
        ExportFormat::Json => write_country_json(file, view),
        ExportFormat::Csv => write_country_csv(file, view),
    }
}

pub fn write_country_json<W: Write>(writer: W, view: &CountryView) -> Result<(), AppError> {
    let payload = CountryExport {
        tool: "covid",
        summary: view.summary(),
        dates: view.dates().to_vec(),
        series: aligned_series(view)
            .into_iter()
            .map(|(m, values)| (m.key(), values))
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &payload)
        .map_err(|e| AppError::invalid_input(format!("Failed to write export JSON: {e}")))
}

pub fn write_country_csv<W: Write>(writer: W, view: &CountryView) -> Result<(), AppError> {
    let series = aligned_series(view);
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["date"];
    header.extend(series.iter().map(|(m, _)| m.key()));
    out.write_record(&header)
        .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV header: {e}")))?;

    for (i, date) in view.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(series.len() + 1);
        record.push(date.to_string());
        for (_, values) in &series {
            record.push(values[i].map(|v| v.to_string()).unwrap_or_default());
        }
        out.write_record(&record)
            .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::invalid_input(format!("Failed to flush export CSV: {e}")))
}
