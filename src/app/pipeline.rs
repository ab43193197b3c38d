//! Shared dashboard pipeline used by the CLI and TUI front-ends.
//!
//! dataset -> per-country views -> chart payloads
//!
//! The front-ends only deal with presentation (printing vs widgets).

use log::info;
use rayon::prelude::*;

use crate::domain::{Dataset, DashboardConfig, Metric, Series};
use crate::error::AppError;
use crate::plot::palette::MAX_SERIES;
use crate::stats::{CountrySummary, CountryView};

/// Metrics drawn as line charts, in dashboard order.
pub const LINE_METRICS: [Metric; 4] = [
    Metric::CasesByPopulation,
    Metric::RNumber,
    Metric::DeathsByPopulation,
    Metric::VaccinationsByPopulation,
];

/// Everything the dashboard draws for one country.
#[derive(Debug, Clone)]
pub struct CountryPanel {
    /// Palette index.
    pub color: usize,
    pub summary: CountrySummary,
    /// Trailing window of each [`LINE_METRICS`] entry, aligned to the view's date axis.
    pub lines: Vec<(Metric, Series)>,
}

impl CountryPanel {
    pub fn line(&self, metric: Metric) -> Option<&Series> {
        self.lines.iter().find(|(m, _)| *m == metric).map(|(_, s)| s)
    }
}

/// All computed outputs of a single dashboard run.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub panels: Vec<CountryPanel>,
    pub window_days: usize,
}

/// Build every country view and assemble chart payloads.
pub fn build_dashboard(dataset: &Dataset, config: &DashboardConfig) -> Result<Dashboard, AppError> {
    if config.countries.is_empty() {
        return Err(AppError::invalid_input("No countries selected."));
    }
    if config.countries.len() > MAX_SERIES {
        return Err(AppError::invalid_input(format!(
            "The maximum number of countries which can be plotted is {MAX_SERIES}."
        )));
    }
    if config.window_days == 0 {
        return Err(AppError::invalid_input("Chart window must be at least one day."));
    }

    let views = build_views(dataset, &config.countries)?;

    let panels = views
        .iter()
        .enumerate()
        .map(|(color, view)| CountryPanel {
            color,
            summary: view.summary(),
            lines: LINE_METRICS
                .iter()
                .map(|&m| (m, view.metric(m).aligned_to(view.dates()).tail(config.window_days)))
                .collect(),
        })
        .collect();

    info!("dashboard built for {} country(ies)", views.len());

    Ok(Dashboard {
        panels,
        window_days: config.window_days,
    })
}

/// Build views in parallel; the first unknown country (in input order) fails the run.
pub fn build_views(dataset: &Dataset, countries: &[String]) -> Result<Vec<CountryView>, AppError> {
    countries
        .par_iter()
        .map(|c| CountryView::build(dataset, c))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::Observation;
    use crate::error::ErrorKind;

    fn dataset(countries: &[&str], days: i64) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
        let mut rows = Vec::new();
        for (k, c) in countries.iter().enumerate() {
            for i in 0..days {
                rows.push(Observation {
                    new_cases: Some(10.0 * (k + 1) as f64),
                    new_deaths: Some(1.0),
                    total_vaccinations: Some(100.0 * i as f64),
                    people_vaccinated: Some(50.0),
                    people_fully_vaccinated: Some(25.0),
                    population: Some(100_000.0),
                    ..Observation::empty(*c, start + chrono::Duration::days(i))
                });
            }
        }
        Dataset::from_rows(rows)
    }

    fn config(countries: &[&str], window_days: usize) -> DashboardConfig {
        DashboardConfig {
            countries: countries.iter().map(|c| c.to_string()).collect(),
            window_days,
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn panels_follow_input_order_and_window() {
        let ds = dataset(&["Germany", "Slovakia"], 90);
        let dash = build_dashboard(&ds, &config(&["slovakia", "Germany"], 60)).unwrap();

        assert_eq!(dash.panels.len(), 2);
        assert_eq!(dash.panels[0].summary.name, "Slovakia");
        assert_eq!(dash.panels[0].color, 0);
        assert_eq!(dash.panels[1].color, 1);
        for panel in &dash.panels {
            assert_eq!(panel.lines.len(), LINE_METRICS.len());
            for (_, s) in &panel.lines {
                assert_eq!(s.len(), 60);
            }
        }
        let cases = dash.panels[1].line(Metric::CasesByPopulation).unwrap();
        assert_eq!(cases.last(), Some(70.0));
        assert_eq!(dash.panels[0].summary.current_cases_by_population, Some(140.0));
    }

    #[test]
    fn unknown_country_fails_the_dashboard() {
        let ds = dataset(&["Germany"], 10);
        let err = build_dashboard(&ds, &config(&["Germany", "Atlantis"], 7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCountry);
    }

    #[test]
    fn too_many_countries_is_rejected() {
        let names: Vec<String> = (0..11).map(|i| format!("C{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let ds = dataset(&refs, 3);
        let err = build_dashboard(&ds, &config(&refs, 7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn short_history_keeps_full_axis() {
        let ds = dataset(&["Malta"], 10);
        let dash = build_dashboard(&ds, &config(&["Malta"], 60)).unwrap();
        let vacc = dash.panels[0].line(Metric::VaccinationsByPopulation).unwrap();
        assert_eq!(vacc.len(), 10);
    }
}
