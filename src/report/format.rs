//! Formatted terminal output: dashboard summary table and country listing.

use crate::app::pipeline::Dashboard;
use crate::domain::Dataset;
use crate::stats::CountrySummary;

/// Format the scalar metrics of every panel as a fixed-width table.
pub fn format_summary(dashboard: &Dashboard) -> String {
    let summaries: Vec<&CountrySummary> = dashboard.panels.iter().map(|p| &p.summary).collect();
    format_summary_table(&summaries)
}

pub fn format_summary_table(rows: &[&CountrySummary]) -> String {
    let mut out = String::new();
    out.push_str("=== COVID-19 dashboard (Our World In Data) ===\n");

    out.push_str(
        format!(
            "{:<20} {:>10} {:>14} {:>14} {:>12} {:>12} {:>12}\n",
            "country", "latest", "population", "cases/100k/7d", "doses/100", "vacc %", "full %"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<10} {:-<14} {:-<14} {:-<12} {:-<12} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for s in rows {
        let latest = s
            .latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:<20} {:>10} {:>14} {:>14} {:>12} {:>12} {:>12}\n",
                truncate(&s.name, 20),
                latest,
                fmt_opt(s.population, 0),
                fmt_opt(s.current_cases_by_population, 1),
                fmt_opt(s.total_vaccinations_by_population, 1),
                fmt_opt(s.total_vaccinated_by_population, 1),
                fmt_opt(s.total_fully_vaccinated_by_population, 1),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// One location per line, with a count header.
pub fn format_locations(dataset: &Dataset) -> String {
    let locations = dataset.locations();
    let mut out = format!(
        "{} location(s), {} row(s), latest date {}\n",
        locations.len(),
        dataset.rows.len(),
        dataset
            .latest_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    for loc in locations {
        out.push_str(&loc);
        out.push('\n');
    }
    out
}

/// `-` for no data, otherwise fixed precision.
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(name: &str, cases: Option<f64>) -> CountrySummary {
        CountrySummary {
            name: name.to_string(),
            latest_date: NaiveDate::from_ymd_opt(2021, 10, 1),
            population: Some(83_000_000.0),
            current_cases_by_population: cases,
            total_vaccinations_by_population: Some(130.25),
            total_vaccinated_by_population: Some(68.04),
            total_fully_vaccinated_by_population: None,
        }
    }

    #[test]
    fn table_marks_no_data_with_dash() {
        let a = summary("Germany", Some(71.26));
        let b = summary("Slovakia", None);
        let txt = format_summary_table(&[&a, &b]);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[3].starts_with("Germany"));
        assert!(lines[3].contains("71.3"));
        assert!(lines[3].contains("2021-10-01"));
        assert!(lines[3].ends_with('-'));
        assert!(lines[4].contains(" - "));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("Democratic Republic of Congo", 10), "Democrati.");
        assert_eq!(truncate("Malta", 10), "Malta");
    }

    #[test]
    fn fmt_opt_precision() {
        assert_eq!(fmt_opt(Some(1.23456), 2), "1.23");
        assert_eq!(fmt_opt(None, 2), "-");
        assert_eq!(fmt_opt(Some(f64::NAN), 2), "-");
    }
}
