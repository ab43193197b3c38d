//! Rolling-window arithmetic over `Option<f64>` slices.
//!
//! Every function returns one output per input entry so results stay aligned
//! to the caller's date axis. `None` means "no data" and propagates: any
//! window or operand touching a `None` yields `None`.

use chrono::NaiveDate;

/// Number of trailing entries inspected by [`truncate_trailing_gaps`].
pub const TRAILING_GAP_LOOKBACK: usize = 7;

/// Sum of the trailing `n` entries ending at each index.
///
/// Undefined where fewer than `n` entries are available or any entry in the
/// window is missing. A zero-length window is undefined everywhere.
pub fn window_sum(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if n == 0 || t + 1 < n {
                return None;
            }
            values[t + 1 - n..=t]
                .iter()
                .try_fold(0.0, |acc, v| v.map(|v| acc + v))
        })
        .collect()
}

/// Trailing mean over `n` entries (see [`window_sum`] for definedness).
pub fn window_mean(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    window_sum(values, n)
        .into_iter()
        .map(|s| s.map(|s| s / n as f64))
        .collect()
}

/// Shift forward by `k`: `out[t] = values[t - k]`, `None` before the start.
pub fn lag(values: &[Option<f64>], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| if t >= k { values[t - k] } else { None })
        .collect()
}

/// Element-wise division; a zero or missing denominator is "no data".
pub fn ratio(num: &[Option<f64>], den: &[Option<f64>]) -> Vec<Option<f64>> {
    num.iter()
        .zip(den.iter())
        .map(|(n, d)| divide(*n, *d))
        .collect()
}

/// `num / den`, `None` unless both are present and the result is finite.
pub fn divide(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    let (n, d) = (num?, den?);
    if d == 0.0 {
        return None;
    }
    let v = n / d;
    if v.is_finite() { Some(v) } else { None }
}

/// First difference: `out[t] = values[t] - values[t - 1]`; the first entry is `None`.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if t == 0 {
                return None;
            }
            Some(values[t]? - values[t - 1]?)
        })
        .collect()
}

/// Linearly interpolate interior gaps, weighting by day distance.
///
/// Entries before the first or after the last present value stay `None`.
pub fn interpolate_linear(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut prev: Option<usize> = None;

    for (j, v) in values.iter().enumerate() {
        let Some(vj) = *v else { continue };
        if let Some(i) = prev {
            if j > i + 1 {
                // `i` is only ever set on a present entry.
                let vi = values[i].unwrap_or(vj);
                let span = (dates[j] - dates[i]).num_days() as f64;
                for (k, slot) in out.iter_mut().enumerate().take(j).skip(i + 1) {
                    let frac = if span > 0.0 {
                        (dates[k] - dates[i]).num_days() as f64 / span
                    } else {
                        (k - i) as f64 / (j - i) as f64
                    };
                    *slot = Some(vi + (vj - vi) * frac);
                }
            }
        }
        prev = Some(j);
    }

    out
}

/// Length of `values` after dropping trailing zero/missing entries.
///
/// At most `max_drop` entries are removed; removal stops at the first present,
/// non-zero value. The upstream feed sometimes reports "not yet reported" as
/// zero for the most recent days.
pub fn truncate_trailing_gaps(values: &[Option<f64>], max_drop: usize) -> usize {
    let mut len = values.len();
    for _ in 0..max_drop {
        match values[..len].last() {
            Some(v) if v.is_none_or(|x| x == 0.0) => len -= 1,
            _ => break,
        }
    }
    len
}

/// Sum of the present entries; `None` when nothing is present.
pub fn sum_present(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Divide every entry by a scalar (e.g. population / 100_000).
pub fn per(values: &[Option<f64>], divisor: Option<f64>) -> Vec<Option<f64>> {
    values.iter().map(|v| divide(*v, divisor)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn some(xs: &[f64]) -> Vec<Option<f64>> {
        xs.iter().copied().map(Some).collect()
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn window_sum_requires_full_window() {
        let out = window_sum(&some(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn window_sum_propagates_missing() {
        let vals = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = window_sum(&vals, 2);
        assert_eq!(out, vec![None, None, None, Some(7.0), Some(9.0)]);
    }

    #[test]
    fn window_sum_zero_length_is_undefined() {
        assert_eq!(window_sum(&some(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn window_mean_divides_by_window() {
        let out = window_mean(&some(&[2.0, 4.0, 6.0]), 2);
        assert_eq!(out, vec![None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn lag_shifts_and_pads() {
        assert_eq!(lag(&some(&[1.0, 2.0, 3.0]), 2), vec![None, None, Some(1.0)]);
        assert_eq!(lag(&some(&[1.0]), 0), vec![Some(1.0)]);
    }

    #[test]
    fn ratio_never_produces_infinity() {
        let out = ratio(&some(&[1.0, 0.0, 2.0]), &[Some(0.0), Some(0.0), None]);
        assert_eq!(out, vec![None, None, None]);
        assert_eq!(divide(Some(0.0), Some(5.0)), Some(0.0));
    }

    #[test]
    fn diff_first_entry_is_undefined() {
        let vals = vec![Some(10.0), Some(15.0), None, Some(30.0)];
        assert_eq!(diff(&vals), vec![None, Some(5.0), None, None]);
    }

    #[test]
    fn interpolate_fills_interior_gaps_only() {
        let dates: Vec<_> = (0..6).map(day).collect();
        let vals = vec![None, Some(10.0), None, None, Some(40.0), None];
        let out = interpolate_linear(&dates, &vals);
        assert_eq!(out[0], None);
        assert_approx_eq!(out[2].unwrap(), 20.0);
        assert_approx_eq!(out[3].unwrap(), 30.0);
        assert_eq!(out[4], Some(40.0));
        assert_eq!(out[5], None);
    }

    #[test]
    fn interpolate_weights_by_day_distance() {
        // Rows for days 0, 1 and 4: the missing day 1 sits a quarter of the way.
        let dates = vec![day(0), day(1), day(4)];
        let vals = vec![Some(0.0), None, Some(100.0)];
        let out = interpolate_linear(&dates, &vals);
        assert_approx_eq!(out[1].unwrap(), 25.0);
    }

    #[test]
    fn truncation_stops_at_first_reported_value() {
        let vals = vec![
            Some(3.0),
            Some(5.0),
            Some(0.0),
            Some(0.0),
            None,
            Some(0.0),
            Some(0.0),
            Some(0.0),
        ];
        let len = truncate_trailing_gaps(&vals, TRAILING_GAP_LOOKBACK);
        assert_eq!(len, 2);
        assert_eq!(vals[len - 1], Some(5.0));
    }

    #[test]
    fn truncation_removes_at_most_seven() {
        let mut vals = some(&[9.0]);
        vals.extend(std::iter::repeat_n(Some(0.0), 9));
        let len = truncate_trailing_gaps(&vals, TRAILING_GAP_LOOKBACK);
        assert_eq!(len, vals.len() - 7);

        let zeros = vec![Some(0.0); 7];
        assert_eq!(truncate_trailing_gaps(&zeros, TRAILING_GAP_LOOKBACK), 0);
        assert_eq!(truncate_trailing_gaps(&[], TRAILING_GAP_LOOKBACK), 0);
    }

    #[test]
    fn truncation_keeps_series_ending_in_value() {
        let vals = vec![None, Some(0.0), Some(4.0)];
        assert_eq!(truncate_trailing_gaps(&vals, TRAILING_GAP_LOOKBACK), 3);
    }

    #[test]
    fn sum_present_skips_missing() {
        assert_eq!(sum_present(&[None, Some(2.0), Some(3.0)]), Some(5.0));
        assert_eq!(sum_present(&[None, None]), None);
    }

    #[test]
    fn per_handles_missing_divisor() {
        assert_eq!(per(&some(&[10.0]), None), vec![None]);
        assert_eq!(per(&some(&[10.0]), Some(0.0)), vec![None]);
        assert_eq!(per(&some(&[10.0]), Some(2.0)), vec![Some(5.0)]);
    }
}
