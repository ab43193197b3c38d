//! Command-line parsing for the COVID-19 dashboard.
//!
//! Argument parsing and command dispatch stay separate from the statistics
//! code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::domain::{DEFAULT_WINDOW_DAYS, Metric};
use crate::io::export::ExportFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid", version, about = "COVID-19 statistics dashboard (Our World In Data)")]
pub struct Cli {
    /// Log verbosity (defaults to `warn`, or `off` for the interactive dashboard).
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard for a set of countries.
    Dashboard(DashboardArgs),
    /// Interactive dashboard scoped to a single country.
    Country(CountryArgs),
    /// Print the latest per-country figures as a table.
    Summary(SummaryArgs),
    /// Plot one metric for one country in the terminal.
    Plot(PlotArgs),
    /// Export one country's series to JSON or CSV.
    Export(ExportArgs),
    /// List the locations present in the dataset.
    Countries(SourceArgs),
}

/// Where to get the dataset from.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Read a local OWID CSV instead of downloading it.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Dataset URL (overrides `OWID_DATA_URL`).
    #[arg(long)]
    pub url: Option<String>,

    /// Request timeout in seconds (overrides `OWID_TIMEOUT_SECS`).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Total download attempts (overrides `OWID_RETRIES`).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Country to include (repeatable). Defaults to the standard European set.
    #[arg(short = 'c', long = "country", value_name = "NAME")]
    pub countries: Vec<String>,

    /// Days shown on the line charts.
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: usize,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CountryArgs {
    /// Country name (case-insensitive).
    pub name: String,

    /// Days shown on the line charts.
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: usize,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    /// Country to include (repeatable). Defaults to the standard European set.
    #[arg(short = 'c', long = "country", value_name = "NAME")]
    pub countries: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Country name (case-insensitive).
    #[arg(short = 'c', long)]
    pub country: String,

    /// Metric to plot.
    #[arg(short = 'm', long, value_enum, default_value_t = Metric::CasesByPopulation)]
    pub metric: Metric,

    /// Trailing days to plot.
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Country name (case-insensitive).
    #[arg(short = 'c', long)]
    pub country: String,

    /// Output file.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub out: PathBuf,

    /// Output format (inferred from the extension when omitted).
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_countries() {
        let cli = Cli::parse_from(["covid", "dashboard", "-c", "Germany", "-c", "Slovakia", "--days", "90"]);
        let Command::Dashboard(args) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(args.countries, vec!["Germany", "Slovakia"]);
        assert_eq!(args.days, 90);
        assert!(args.source.csv.is_none());
    }

    #[test]
    fn parses_plot_metric_and_global_log_level() {
        let cli = Cli::parse_from([
            "covid", "plot", "-c", "Germany", "-m", "r-number", "--log-level", "debug",
        ]);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let Command::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        assert_eq!(args.metric, Metric::RNumber);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
