//! Shared domain types.
//!
//! "No data" is always `None`. Nothing in this crate coerces a missing value
//! to zero; charts and exports rely on being able to tell the two apart.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default OWID dataset location.
pub const OWID_DATA_URL: &str =
    "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/owid-covid-data.csv";

/// Countries shown by the default dashboard.
pub const DEFAULT_COUNTRIES: [&str; 5] = [
    "Germany",
    "Netherlands",
    "Slovakia",
    "United Kingdom",
    "European Union",
];

/// Number of trailing days shown on the dashboard line charts.
pub const DEFAULT_WINDOW_DAYS: usize = 60;

/// One raw row of the OWID CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub date: NaiveDate,
    pub new_cases: Option<f64>,
    pub new_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
    pub people_vaccinated: Option<f64>,
    pub people_fully_vaccinated: Option<f64>,
    pub population: Option<f64>,
}

impl Observation {
    /// An observation with every numeric field missing.
    pub fn empty(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            date,
            new_cases: None,
            new_deaths: None,
            total_vaccinations: None,
            people_vaccinated: None,
            people_fully_vaccinated: None,
            population: None,
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// The full table of daily observations, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<Observation>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<Observation>) -> Self {
        Self {
            rows_read: rows.len(),
            rows,
            row_errors: Vec::new(),
        }
    }

    /// Sorted, de-duplicated location names.
    pub fn locations(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.location.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Latest date present anywhere in the table.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }
}

/// A numeric series keyed by date.
///
/// `dates` and `values` always have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl Series {
    /// Pair `dates` with `values`. Both must come from the same axis.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len(), "series dates/values length mismatch");
        Self { dates, values }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the last date (`None` when empty or missing).
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// The last `n` entries (or all of them when shorter).
    pub fn tail(&self, n: usize) -> Series {
        let start = self.len().saturating_sub(n);
        Series {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Keep only the first `len` entries.
    pub fn truncated(&self, len: usize) -> Series {
        let len = len.min(self.len());
        Series {
            dates: self.dates[..len].to_vec(),
            values: self.values[..len].to_vec(),
        }
    }

    /// Re-index onto `axis`; dates absent from this series become `None`.
    pub fn aligned_to(&self, axis: &[NaiveDate]) -> Series {
        let mut values = Vec::with_capacity(axis.len());
        let mut j = 0usize;
        for date in axis {
            while j < self.dates.len() && self.dates[j] < *date {
                j += 1;
            }
            if j < self.dates.len() && self.dates[j] == *date {
                values.push(self.values[j]);
            } else {
                values.push(None);
            }
        }
        Series {
            dates: axis.to_vec(),
            values,
        }
    }

    /// Present values only, with their dates.
    pub fn present(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points().filter_map(|(d, v)| v.map(|v| (d, v)))
    }
}

/// Named metrics exposed by the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// New cases per day.
    Cases,
    /// New deaths per day.
    Deaths,
    /// Daily vaccination doses (differenced cumulative doses).
    Vaccinations,
    /// Cases in the previous week per 100k people.
    CasesByPopulation,
    /// Deaths in the previous week per 100k people.
    DeathsByPopulation,
    /// Average daily doses in the previous week per 100 people.
    VaccinationsByPopulation,
    /// Simplified R-number (lag 4, 7-day windows).
    RNumber,
    /// Cases over the last 14 days.
    ActiveCases,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Cases,
        Metric::Deaths,
        Metric::Vaccinations,
        Metric::CasesByPopulation,
        Metric::DeathsByPopulation,
        Metric::VaccinationsByPopulation,
        Metric::RNumber,
        Metric::ActiveCases,
    ];

    /// Chart title used by the dashboard and ASCII plots.
    pub fn title(self) -> &'static str {
        match self {
            Metric::Cases => "New cases per day",
            Metric::Deaths => "New deaths per day",
            Metric::Vaccinations => "Vaccinations per day",
            Metric::CasesByPopulation => "Cases in previous week per 100k people",
            Metric::DeathsByPopulation => "Deaths in previous week per 100k people",
            Metric::VaccinationsByPopulation => "Average vaccinations in last 7 days per 100 people",
            Metric::RNumber => "R-Number",
            Metric::ActiveCases => "Active cases (14-day recovery)",
        }
    }

    /// Short column/axis name.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
            Metric::Vaccinations => "vaccinations",
            Metric::CasesByPopulation => "cases_by_population",
            Metric::DeathsByPopulation => "deaths_by_population",
            Metric::VaccinationsByPopulation => "vaccinations_by_population",
            Metric::RNumber => "r_number",
            Metric::ActiveCases => "active_cases",
        }
    }
}

/// Where the dataset comes from and how to fetch it.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Read a local CSV instead of downloading.
    pub csv_path: Option<PathBuf>,
    pub url: String,
    pub timeout: Duration,
    /// Total attempts (>= 1).
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            url: OWID_DATA_URL.to_string(),
            timeout: Duration::from_secs(60),
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// A dashboard run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub countries: Vec<String>,
    /// Trailing days shown on line charts.
    pub window_days: usize,
    pub source: SourceConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            window_days: DEFAULT_WINDOW_DAYS,
            source: SourceConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    #[test]
    fn aligned_to_pads_missing_dates_with_none() {
        let s = Series::new(vec![d(1), d(2)], vec![Some(1.0), Some(0.0)]);
        let aligned = s.aligned_to(&[d(1), d(2), d(3), d(4)]);
        assert_eq!(aligned.len(), 4);
        assert_eq!(aligned.values(), &[Some(1.0), Some(0.0), None, None]);
        assert_eq!(aligned.dates()[3], d(4));
    }

    #[test]
    fn tail_and_last() {
        let s = Series::new(vec![d(1), d(2), d(3)], vec![Some(1.0), Some(2.0), None]);
        let t = s.tail(2);
        assert_eq!(t.dates(), &[d(2), d(3)]);
        assert_eq!(t.last(), None);
        assert_eq!(s.truncated(2).last(), Some(2.0));
        assert_eq!(s.tail(10).len(), 3);
    }

    #[test]
    fn locations_are_sorted_and_unique() {
        let ds = Dataset::from_rows(vec![
            Observation::empty("Slovakia", d(1)),
            Observation::empty("Germany", d(1)),
            Observation::empty("Slovakia", d(2)),
        ]);
        assert_eq!(ds.locations(), vec!["Germany".to_string(), "Slovakia".to_string()]);
        assert_eq!(ds.latest_date(), Some(d(2)));
    }
}
