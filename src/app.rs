//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the logger
//! - loads the OWID dataset
//! - builds country views and dashboard payloads
//! - prints reports/plots, writes exports, or launches the TUI

use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use crate::cli::{
    Command, CountryArgs, DashboardArgs, ExportArgs, LogLevel, PlotArgs, SourceArgs, SummaryArgs,
};
use crate::data::owid::{load_dataset, source_config_from_env};
use crate::domain::{DashboardConfig, SourceConfig};
use crate::error::AppError;
use crate::io::export::{ExportFormat, export_country};
use crate::stats::CountryView;

pub mod pipeline;

/// Entry point for the `covid` binary.
pub fn run() -> Result<(), AppError> {
    // `covid` and `covid -c Germany` behave like `covid dashboard ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let interactive = matches!(cli.command, Command::Dashboard(_) | Command::Country(_));
    init_logging(cli.log_level, interactive);

    match cli.command {
        Command::Dashboard(args) => handle_dashboard(args),
        Command::Country(args) => handle_country(args),
        Command::Summary(args) => handle_summary(args),
        Command::Plot(args) => handle_plot(args),
        Command::Export(args) => handle_export(args),
        Command::Countries(args) => handle_countries(args),
    }
}

fn init_logging(level: Option<LogLevel>, interactive: bool) {
    // Log lines on stderr would tear the TUI's alternate screen.
    let filter = match level {
        Some(level) => level.to_filter(),
        None if interactive => LevelFilter::Off,
        None => LevelFilter::Warn,
    };
    if let Err(e) = SimpleLogger::new().with_level(filter).init() {
        eprintln!("logger already initialized: {e}");
    }
}

fn handle_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let config = dashboard_config(&args.countries, args.days, &args.source);
    crate::tui::run(config)
}

fn handle_country(args: CountryArgs) -> Result<(), AppError> {
    let config = dashboard_config(std::slice::from_ref(&args.name), args.days, &args.source);
    crate::tui::run(config)
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = dashboard_config(&args.countries, crate::domain::DEFAULT_WINDOW_DAYS, &args.source);
    let dataset = load_dataset(&config.source)?;
    let dashboard = pipeline::build_dashboard(&dataset, &config)?;
    print!("{}", crate::report::format_summary(&dashboard));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    if args.days == 0 {
        return Err(AppError::invalid_input("`--days` must be at least 1."));
    }
    let dataset = load_dataset(&source_config_from_args(&args.source))?;
    let view = CountryView::build(&dataset, &args.country)?;
    let series = view
        .metric(args.metric)
        .aligned_to(view.dates())
        .tail(args.days);
    let title = format!("{} | {}", args.metric.title(), view.name());
    println!(
        "{}",
        crate::plot::render_ascii_series(&title, &series, args.width, args.height)
    );
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let dataset = load_dataset(&source_config_from_args(&args.source))?;
    let view = CountryView::build(&dataset, &args.country)?;
    let format = args
        .format
        .unwrap_or_else(|| ExportFormat::from_path(&args.out));
    export_country(&args.out, &view, format)?;
    println!("Wrote {} ({} days) to {}", view.name(), view.dates().len(), args.out.display());
    Ok(())
}

fn handle_countries(args: SourceArgs) -> Result<(), AppError> {
    let dataset = load_dataset(&source_config_from_args(&args))?;
    print!("{}", crate::report::format_locations(&dataset));
    Ok(())
}

pub fn dashboard_config(countries: &[String], days: usize, source: &SourceArgs) -> DashboardConfig {
    let mut config = DashboardConfig {
        window_days: days,
        source: source_config_from_args(source),
        ..DashboardConfig::default()
    };
    if !countries.is_empty() {
        config.countries = countries.to_vec();
    }
    config
}

/// Environment defaults, overridden by explicit flags.
pub fn source_config_from_args(args: &SourceArgs) -> SourceConfig {
    let mut config = source_config_from_env();
    if let Some(path) = &args.csv {
        config.csv_path = Some(path.clone());
    }
    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(n) = args.retries {
        config.attempts = n.max(1);
    }
    config
}

/// Rewrite argv so `covid` defaults to `covid dashboard`.
///
/// Rules:
/// - `covid`                      -> `covid dashboard`
/// - `covid -c Germany ...`       -> `covid dashboard -c Germany ...`
/// - `covid --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "dashboard" | "country" | "summary" | "plot" | "export" | "countries"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dashboard flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_dashboard() {
        assert_eq!(rewrite_args(args(&["covid"])), args(&["covid", "dashboard"]));
        assert_eq!(
            rewrite_args(args(&["covid", "-c", "Germany"])),
            args(&["covid", "dashboard", "-c", "Germany"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(args(&["covid", "--help"])), args(&["covid", "--help"]));
        assert_eq!(
            rewrite_args(args(&["covid", "summary"])),
            args(&["covid", "summary"])
        );
    }

    #[test]
    fn flags_override_source_defaults() {
        let source = SourceArgs {
            csv: Some("owid.csv".into()),
            url: None,
            timeout: Some(5),
            retries: Some(0),
        };
        let config = dashboard_config(&[], 30, &source);
        assert_eq!(config.countries.len(), crate::domain::DEFAULT_COUNTRIES.len());
        assert_eq!(config.window_days, 30);
        assert_eq!(config.source.csv_path.as_deref(), Some(std::path::Path::new("owid.csv")));
        assert_eq!(config.source.timeout, Duration::from_secs(5));
        assert_eq!(config.source.attempts, 1);
    }
}
