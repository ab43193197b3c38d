//! ASCII line charts for `covid plot`.
//!
//! Fixed-size character grid with deterministic output. Days with no data
//! leave a gap in the line rather than dropping to zero.

use crate::domain::Series;

/// Render one date-keyed series as a line plot.
pub fn render_ascii_series(title: &str, series: &Series, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();
    let (Some(first), Some(last)) = (series.dates().first(), series.dates().last()) else {
        out.push_str(&format!("Plot: {title} | no data\n"));
        return out;
    };

    let Some((y_min, y_max)) = y_range(series) else {
        out.push_str(&format!("Plot: {title} | {first}..{last} | no data\n"));
        return out;
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let n = series.len();

    let mut prev: Option<(usize, usize)> = None;
    for (i, v) in series.values().iter().enumerate() {
        let Some(v) = *v else {
            prev = None;
            continue;
        };
        let x = map_x(i, n, width);
        let y = map_y(v, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '*'),
            None => grid[y][x] = '*',
        }
        prev = Some((x, y));
    }

    out.push_str(&format!(
        "Plot: {title} | {first}..{last} | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn y_range(series: &Series) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (_, v) in series.present() {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat line: open a unit band around it.
        Some((min_y - 0.5, max_y + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: Vec<Option<f64>>) -> Series {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let dates = (0..values.len() as i64)
            .map(|i| start + chrono::Duration::days(i))
            .collect();
        Series::new(dates, values)
    }

    #[test]
    fn rising_cases_render_as_diagonal() {
        let s = series(vec![Some(0.0), Some(10.0)]);
        let txt = render_ascii_series("cases", &s, 10, 5);
        let expected = concat!(
            "Plot: cases | 2021-01-01..2021-01-02 | y=[-0.50, 10.50]\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn missing_values_break_the_line() {
        let s = series(vec![Some(1.0), None, Some(1.0)]);
        let txt = render_ascii_series("r", &s, 11, 5);
        let row: &str = txt.lines().nth(3).unwrap();
        assert_eq!(row, "*         *");
    }

    #[test]
    fn empty_series_reports_no_data() {
        let s = series(vec![None, None]);
        assert!(render_ascii_series("x", &s, 10, 5).contains("no data"));
        assert!(render_ascii_series("x", &Series::default(), 10, 5).contains("no data"));
    }
}
