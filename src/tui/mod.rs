//! Ratatui-based terminal dashboard.
//!
//! Two bar panels (current weekly cases, vaccination coverage) above four
//! time-series charts (cases, R-number, deaths, vaccinations), one coloured
//! line per country.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{Dashboard, LINE_METRICS, build_dashboard};
use crate::data::owid::load_dataset;
use crate::domain::{DashboardConfig, Dataset, Metric, Series};
use crate::error::AppError;
use crate::plot::palette;

mod plotters_chart;

use plotters_chart::{ChartLine, SeriesChart};

const MIN_WINDOW_DAYS: usize = 30;
const MAX_WINDOW_DAYS: usize = 365;
const WINDOW_STEP: usize = 30;

/// Bar values are integers; keep one decimal of resolution.
const BAR_SCALE: f64 = 10.0;

const MAX_LABEL_WIDTH: usize = 16;
/// Room for " 100.0 / 100.0".
const VALUE_WIDTH: usize = 14;

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    // Load before switching screens so data errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: DashboardConfig,
    dataset: Dataset,
    dashboard: Dashboard,
    status: String,
}

impl App {
    fn new(config: DashboardConfig) -> Result<Self, AppError> {
        let dataset = load_dataset(&config.source)?;
        let dashboard = build_dashboard(&dataset, &config)?;
        let status = loaded_status(&dataset);
        Ok(Self {
            config,
            dataset,
            dashboard,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Left => self.adjust_window(-1),
            KeyCode::Right => self.adjust_window(1),
            _ => {}
        }
        false
    }

    /// Re-download the dataset and recompute everything.
    fn refresh(&mut self) {
        let result = load_dataset(&self.config.source)
            .and_then(|dataset| build_dashboard(&dataset, &self.config).map(|dash| (dataset, dash)));
        match result {
            Ok((dataset, dashboard)) => {
                self.status = loaded_status(&dataset);
                self.dataset = dataset;
                self.dashboard = dashboard;
            }
            Err(err) => self.status = format!("Refresh failed: {err}"),
        }
    }

    fn adjust_window(&mut self, delta: i32) {
        let next = next_window(self.config.window_days, delta);
        if next == self.config.window_days {
            return;
        }
        self.config.window_days = next;
        match build_dashboard(&self.dataset, &self.config) {
            Ok(dashboard) => {
                self.dashboard = dashboard;
                self.status = format!("window: {next} days");
            }
            Err(err) => self.status = format!("Rebuild failed: {err}"),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        let latest = self
            .dataset
            .latest_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(vec![
            Span::styled("covid", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " | Our World In Data | latest: {latest} | window: {} days",
                self.dashboard.window_days
            )),
        ]));

        let mut legend = Vec::new();
        for panel in &self.dashboard.panels {
            let (r, g, b) = palette::color(panel.color);
            legend.push(Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))));
            legend.push(Span::raw(format!("{}  ", panel.summary.name)));
        }
        lines.push(Line::from(legend));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ])
            .split(area);

        let bars = halves(rows[0]);
        self.draw_current_cases(frame, bars[0]);
        self.draw_vaccinated(frame, bars[1]);

        let top = halves(rows[1]);
        let bottom = halves(rows[2]);
        let cells = [top[0], top[1], bottom[0], bottom[1]];
        for (metric, cell) in LINE_METRICS.iter().zip(cells) {
            self.draw_line_chart(frame, cell, *metric);
        }
    }

    fn draw_current_cases(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let bars: Vec<Bar> = self
            .dashboard
            .panels
            .iter()
            .map(|p| {
                let (r, g, b) = palette::color(p.color);
                let value = p.summary.current_cases_by_population;
                Bar::default()
                    .label(Line::from(p.summary.name.clone()))
                    .value(bar_value(value))
                    .text_value(crate::report::fmt_opt(value, 1))
                    .style(Style::default().fg(Color::Rgb(r, g, b)))
            })
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .title("Current cases in previous week per 100k people")
                    .borders(Borders::ALL),
            )
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    /// Fully vaccinated (dark) stacked over vaccinated (light) on a 0..100 axis.
    fn draw_vaccinated(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Percentage of the population that has been vaccinated")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label_width = self
            .dashboard
            .panels
            .iter()
            .map(|p| p.summary.name.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_WIDTH);
        let bar_width = usize::from(inner.width).saturating_sub(label_width + 1 + VALUE_WIDTH);

        let mut lines = Vec::new();
        for p in &self.dashboard.panels {
            let (r, g, b) = palette::light_color(p.color);
            let (fr, fg, fb) = palette::color(p.color);
            let vaccinated = p.summary.total_vaccinated_by_population;
            let fully = p.summary.total_fully_vaccinated_by_population;
            let (dark, light) = stacked_cells(vaccinated, fully, bar_width);

            let name: String = p.summary.name.chars().take(label_width).collect();
            lines.push(Line::from(vec![
                Span::raw(format!("{name:<label_width$} ")),
                Span::styled("█".repeat(dark), Style::default().fg(Color::Rgb(fr, fg, fb))),
                Span::styled("█".repeat(light), Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(format!(
                    " {} / {}",
                    crate::report::fmt_opt(vaccinated, 1),
                    crate::report::fmt_opt(fully, 1)
                )),
            ]));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)), inner);
    }

    fn draw_line_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, metric: Metric) {
        let block = Block::default().title(metric.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series: Vec<(usize, &Series)> = self
            .dashboard
            .panels
            .iter()
            .filter_map(|p| p.line(metric).map(|s| (p.color, s)))
            .collect();

        let reference = (metric == Metric::RNumber).then_some(1.0);
        let Some((x_bounds, y_bounds)) = chart_bounds(&series, reference) else {
            let msg = Paragraph::new("No data in window.")
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            frame.render_widget(msg, inner);
            return;
        };

        let lines: Vec<ChartLine> = series
            .iter()
            .map(|(color, s)| ChartLine {
                color: palette::color(*color),
                segments: segments(s),
            })
            .collect();

        let widget = SeriesChart {
            lines: &lines,
            reference,
            x_bounds,
            y_bounds,
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ window  r refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn loaded_status(dataset: &Dataset) -> String {
    info!("dataset loaded: {} rows", dataset.rows.len());
    let mut status = format!("Loaded {} rows", dataset.rows.len());
    if !dataset.row_errors.is_empty() {
        status.push_str(&format!(" ({} skipped)", dataset.row_errors.len()));
    }
    status
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

/// Step the window by 30 days; a step never moves it the opposite way, even
/// when `--days` started outside 30..=365.
fn next_window(current: usize, delta: i32) -> usize {
    if delta >= 0 {
        current
            .saturating_add(WINDOW_STEP)
            .clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS.max(current))
    } else {
        current
            .saturating_sub(WINDOW_STEP)
            .clamp(MIN_WINDOW_DAYS.min(current), MAX_WINDOW_DAYS)
    }
}

/// Cells for the dark (fully) and light (vaccinated only) parts of a
/// stacked percentage bar `width` cells wide.
fn stacked_cells(vaccinated: Option<f64>, fully: Option<f64>, width: usize) -> (usize, usize) {
    let cells = |pct: Option<f64>| {
        pct.filter(|v| v.is_finite())
            .map(|v| ((v.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize)
            .unwrap_or(0)
    };
    let dark = cells(fully);
    let total = cells(vaccinated).max(dark);
    (dark, total - dark)
}

fn bar_value(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite())
        .map(|v| (v.max(0.0) * BAR_SCALE).round() as u64)
        .unwrap_or(0)
}

fn date_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Split a series into runs of present values, so gaps are not drawn as dips.
fn segments(series: &Series) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (date, value) in series.points() {
        match value {
            Some(v) => current.push((date_x(date), v)),
            None => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// X/Y bounds over every present value; Y starts at zero unless data goes
/// negative, and always includes `reference`.
fn chart_bounds(series: &[(usize, &Series)], reference: Option<f64>) -> Option<([f64; 2], [f64; 2])> {
    let x_min = series.iter().filter_map(|(_, s)| s.dates().first()).min()?;
    let x_max = series.iter().filter_map(|(_, s)| s.dates().last()).max()?;

    let (mut y_min, mut y_max) = (0.0_f64, f64::NEG_INFINITY);
    for (_, s) in series {
        for (_, v) in s.present() {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
    }
    if !y_max.is_finite() {
        return None;
    }
    if let Some(r) = reference {
        y_max = y_max.max(r);
    }

    let mut x = [date_x(*x_min), date_x(*x_max)];
    if x[1] <= x[0] {
        x[1] = x[0] + 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let pad = ((y_max - y_min) * 0.05).max(1e-12);
    Some((x, [y_min, y_max + pad]))
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%d-%b").to_string())
        .unwrap_or_default()
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 11, 1).unwrap() + chrono::Duration::days(n)
    }

    fn series(values: Vec<Option<f64>>) -> Series {
        let dates = (0..values.len() as i64).map(day).collect();
        Series::new(dates, values)
    }

    #[test]
    fn segments_split_on_no_data() {
        let s = series(vec![Some(1.0), Some(2.0), None, Some(0.0), None]);
        let segs = segments(&s);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].len(), 2);
        assert_eq!(segs[1], vec![(date_x(day(3)), 0.0)]);
    }

    #[test]
    fn bounds_include_zero_and_reference() {
        let s = series(vec![Some(0.8), Some(0.9), None]);
        let (x, y) = chart_bounds(&[(0, &s)], Some(1.0)).unwrap();
        assert_eq!(x, [date_x(day(0)), date_x(day(2))]);
        assert_eq!(y[0], 0.0);
        assert!(y[1] > 1.0);
    }

    #[test]
    fn bounds_need_some_data() {
        let s = series(vec![None, None]);
        assert!(chart_bounds(&[(0, &s)], None).is_none());
        assert!(chart_bounds(&[], None).is_none());
    }

    #[test]
    fn axis_dates_round_trip() {
        assert_eq!(fmt_axis_date(date_x(day(0))), "01-Nov");
    }

    #[test]
    fn window_steps_are_clamped() {
        assert_eq!(next_window(60, 1), 90);
        assert_eq!(next_window(30, -1), 30);
        assert_eq!(next_window(360, 1), 365);
    }

    #[test]
    fn short_windows_only_shrink_on_left() {
        assert_eq!(next_window(5, -1), 5);
        assert_eq!(next_window(45, -1), 30);
        assert_eq!(next_window(5, 1), 35);
        assert_eq!(next_window(400, -1), 365);
        assert_eq!(next_window(400, 1), 400);
    }

    #[test]
    fn fully_vaccinated_is_stacked_inside_vaccinated() {
        assert_eq!(stacked_cells(Some(75.0), Some(50.0), 40), (20, 10));
        assert_eq!(stacked_cells(Some(75.0), None, 40), (0, 30));
        assert_eq!(stacked_cells(None, None, 40), (0, 0));
        // Over 100% fills the bar without overflowing it.
        assert_eq!(stacked_cells(Some(120.0), Some(110.0), 40), (40, 0));
    }

    #[test]
    fn bar_values_keep_one_decimal() {
        assert_eq!(bar_value(Some(71.26)), 713);
        assert_eq!(bar_value(None), 0);
        assert_eq!(bar_value(Some(-3.0)), 0);
    }
}
