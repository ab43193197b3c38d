//! Plotters-powered time-series chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`. The widget is data-driven: all series and
//! bounds are computed outside the render call.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One country's line, already split at "no data" gaps.
#[derive(Debug, Clone)]
pub struct ChartLine {
    pub color: (u8, u8, u8),
    /// Contiguous runs of present values as `(x, y)` points.
    pub segments: Vec<Vec<(f64, f64)>>,
}

/// A render-only multi-line chart description.
pub struct SeriesChart<'a> {
    pub lines: &'a [ChartLine],
    /// Optional horizontal reference line (e.g. R = 1).
    pub reference: Option<f64>,
    /// X bounds (days from the common era).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SeriesChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; hint instead of panicking.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            if let Some(level) = self.reference {
                if level > y0 && level < y1 {
                    let maroon = RGBColor(128, 0, 0);
                    chart.draw_series(LineSeries::new([(x0, level), (x1, level)], &maroon))?;
                }
            }

            for line in self.lines {
                let (r, g, b) = line.color;
                let color = RGBColor(r, g, b);
                for segment in &line.segments {
                    if segment.len() == 1 {
                        chart.draw_series(segment.iter().map(|&p| Pixel::new(p, color)))?;
                    } else {
                        chart.draw_series(LineSeries::new(segment.iter().copied(), &color))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
