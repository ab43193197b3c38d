//! Per-country view of the dataset and its derived metrics.
//!
//! A [`CountryView`] is built fresh from a [`Dataset`] for every request and
//! never mutated afterwards. All metric methods are pure functions of the
//! view: calling one twice yields identical output.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::domain::{Dataset, Metric, Observation, Series};
use crate::error::AppError;
use crate::stats::window::{
    TRAILING_GAP_LOOKBACK, diff, divide, interpolate_linear, lag, per, ratio, sum_present,
    truncate_trailing_gaps, window_mean, window_sum,
};

/// Days a newly infected person is assumed to stay sick.
pub const DEFAULT_RECOVERY_DAYS: usize = 14;

/// Gap between the two windows compared by the dashboard R-number.
pub const R_NUMBER_LAG: usize = 4;

/// Window length used by the dashboard R-number.
pub const R_NUMBER_WINDOW: usize = 7;

const WEEK: usize = 7;
const PER_100K: f64 = 100_000.0;
const PER_100: f64 = 100.0;

/// One location's series, sorted by date.
#[derive(Debug, Clone)]
pub struct CountryView {
    name: String,
    dates: Vec<NaiveDate>,
    cases: Series,
    deaths: Series,
    cumulative_vaccinations: Series,
    vaccinations: Series,
    people_vaccinated: Series,
    people_fully_vaccinated: Series,
    population: Option<f64>,
}

/// Scalar snapshot of a country, used by bar charts and text reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySummary {
    pub name: String,
    pub latest_date: Option<NaiveDate>,
    pub population: Option<f64>,
    pub current_cases_by_population: Option<f64>,
    pub total_vaccinations_by_population: Option<f64>,
    pub total_vaccinated_by_population: Option<f64>,
    pub total_fully_vaccinated_by_population: Option<f64>,
}

impl CountryView {
    /// Slice `country` out of `dataset` (case-insensitive exact match).
    ///
    /// Rows are sorted ascending by date; when a date repeats, the first row
    /// in file order wins.
    pub fn build(dataset: &Dataset, country: &str) -> Result<Self, AppError> {
        let needle = country.to_lowercase();
        let mut rows: Vec<&Observation> = dataset
            .rows
            .iter()
            .filter(|r| r.location.to_lowercase() == needle)
            .collect();

        if rows.is_empty() {
            return Err(AppError::unknown_country(country));
        }

        // Stable sort, so `dedup` keeps the earliest row in file order.
        rows.sort_by_key(|r| r.date);
        let before = rows.len();
        rows.dedup_by_key(|r| r.date);
        if rows.len() != before {
            warn!(
                "{}: dropped {} row(s) with duplicate dates",
                rows[0].location,
                before - rows.len()
            );
        }

        let view = Self::from_sorted_rows(&rows);
        debug!(
            "built view for {} ({} days, population {:?})",
            view.name,
            view.dates.len(),
            view.population
        );
        Ok(view)
    }

    fn from_sorted_rows(rows: &[&Observation]) -> Self {
        let name = rows[0].location.clone();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        let column = |f: fn(&Observation) -> Option<f64>| -> Vec<Option<f64>> {
            rows.iter().map(|r| f(r)).collect()
        };

        let cases = Series::new(dates.clone(), column(|r| r.new_cases));
        let deaths = Series::new(dates.clone(), column(|r| r.new_deaths));

        let cumulative = interpolate_linear(&dates, &column(|r| r.total_vaccinations));
        let daily = diff(&cumulative);
        let cumulative_vaccinations = Series::new(dates.clone(), cumulative);

        let vaccinations = trim(Series::new(dates.clone(), daily));
        let people_vaccinated = trim(Series::new(dates.clone(), column(|r| r.people_vaccinated)));
        let people_fully_vaccinated =
            trim(Series::new(dates.clone(), column(|r| r.people_fully_vaccinated)));

        let population = rows[0].population.filter(|p| p.is_finite() && *p > 0.0);
        if population.is_none() {
            warn!("{name}: population missing or zero; per-capita metrics are undefined");
        }

        Self {
            name,
            dates,
            cases,
            deaths,
            cumulative_vaccinations,
            vaccinations,
            people_vaccinated,
            people_fully_vaccinated,
            population,
        }
    }

    /// Location name as spelled in the dataset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The date axis shared by every series of this view.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn cases(&self) -> &Series {
        &self.cases
    }

    pub fn deaths(&self) -> &Series {
        &self.deaths
    }

    /// Cumulative doses after interior-gap interpolation.
    pub fn cumulative_vaccinations(&self) -> &Series {
        &self.cumulative_vaccinations
    }

    /// Daily doses; a prefix of the date axis after trailing-gap truncation.
    pub fn vaccinations(&self) -> &Series {
        &self.vaccinations
    }

    pub fn people_vaccinated(&self) -> &Series {
        &self.people_vaccinated
    }

    pub fn people_fully_vaccinated(&self) -> &Series {
        &self.people_fully_vaccinated
    }

    pub fn population(&self) -> Option<f64> {
        self.population
    }

    /// Ratio of cases in a `window_days` window to the same-length window
    /// `lag_days` earlier.
    pub fn r_number(&self, lag_days: usize, window_days: usize) -> Series {
        let current = window_sum(self.cases.values(), window_days);
        let earlier = lag(&current, lag_days);
        Series::new(self.dates.clone(), ratio(&current, &earlier))
    }

    /// Cases over the last `recovery_days`, assuming everyone recovers after
    /// the same fixed time.
    pub fn active_cases(&self, recovery_days: usize) -> Series {
        Series::new(
            self.dates.clone(),
            window_sum(self.cases.values(), recovery_days),
        )
    }

    /// Cases over the last 7 days per 100k people.
    pub fn cases_by_population(&self) -> Series {
        let week = window_sum(self.cases.values(), WEEK);
        Series::new(self.dates.clone(), per(&week, self.per_capita(PER_100K)))
    }

    /// Latest value of [`Self::cases_by_population`].
    pub fn current_cases_by_population(&self) -> Option<f64> {
        self.cases_by_population().last()
    }

    /// Deaths over the last 7 days per 100k people.
    pub fn deaths_by_population(&self) -> Series {
        let week = window_sum(self.deaths.values(), WEEK);
        Series::new(self.dates.clone(), per(&week, self.per_capita(PER_100K)))
    }

    /// Average daily doses over the last 7 days per 100 people.
    pub fn vaccinations_by_population(&self) -> Series {
        let mean = window_mean(self.vaccinations.values(), WEEK);
        Series::new(
            self.vaccinations.dates().to_vec(),
            per(&mean, self.per_capita(PER_100)),
        )
    }

    /// All reported doses per 100 people.
    pub fn total_vaccinations_by_population(&self) -> Option<f64> {
        divide(
            sum_present(self.vaccinations.values()),
            self.per_capita(PER_100),
        )
    }

    /// Percentage of the population with at least one dose.
    pub fn total_vaccinated_by_population(&self) -> Option<f64> {
        divide(self.people_vaccinated.last(), self.population).map(|v| v * 100.0)
    }

    /// Percentage of the population fully vaccinated.
    pub fn total_fully_vaccinated_by_population(&self) -> Option<f64> {
        divide(self.people_fully_vaccinated.last(), self.population).map(|v| v * 100.0)
    }

    /// Series for a named metric, keyed by its own dates.
    pub fn metric(&self, metric: Metric) -> Series {
        match metric {
            Metric::Cases => self.cases.clone(),
            Metric::Deaths => self.deaths.clone(),
            Metric::Vaccinations => self.vaccinations.clone(),
            Metric::CasesByPopulation => self.cases_by_population(),
            Metric::DeathsByPopulation => self.deaths_by_population(),
            Metric::VaccinationsByPopulation => self.vaccinations_by_population(),
            Metric::RNumber => self.r_number(R_NUMBER_LAG, R_NUMBER_WINDOW),
            Metric::ActiveCases => self.active_cases(DEFAULT_RECOVERY_DAYS),
        }
    }

    pub fn summary(&self) -> CountrySummary {
        CountrySummary {
            name: self.name.clone(),
            latest_date: self.dates.last().copied(),
            population: self.population,
            current_cases_by_population: self.current_cases_by_population(),
            total_vaccinations_by_population: self.total_vaccinations_by_population(),
            total_vaccinated_by_population: self.total_vaccinated_by_population(),
            total_fully_vaccinated_by_population: self.total_fully_vaccinated_by_population(),
        }
    }

    /// Population scaled to a reference size (e.g. per 100k people).
    fn per_capita(&self, reference: f64) -> Option<f64> {
        self.population.map(|p| p / reference)
    }
}

fn trim(series: Series) -> Series {
    let len = truncate_trailing_gaps(series.values(), TRAILING_GAP_LOOKBACK);
    series.truncated(len)
}
