//! Series statistics.
//!
//! All rolling helpers return one slot per input element. A slot is `None`
//! until the window behind it is complete, so callers can drop warm-up rows
//! explicitly instead of imputing them.

/// Percent change over `periods` steps: `x[t] / x[t - periods] - 1`.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if periods == 0 || t < periods {
                return None;
            }
            let base = values[t - periods];
            let out = values[t] / base - 1.0;
            out.is_finite().then_some(out)
        })
        .collect()
}

/// Trailing arithmetic mean over `window` values ending at `t` (inclusive).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| window_at(values, t, window).map(mean))
        .collect()
}

/// Trailing sample standard deviation (`n - 1` denominator) over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| window_at(values, t, window).and_then(sample_std))
        .collect()
}

/// Shift a series forward by `periods`: `out[t] = values[t - periods]`.
///
/// After shifting by one, the value at `t` only reflects data up to `t - 1`.
pub fn shift(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| if t < periods { None } else { values[t - periods] })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() as f64 - 1.0)).sqrt())
}

/// Mean absolute error between two equally long slices.
///
/// Returns `None` when the slices are empty or differ in length.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Some(total / actual.len() as f64)
}

fn window_at(values: &[f64], t: usize, window: usize) -> Option<&[f64]> {
    if window == 0 || t + 1 < window {
        return None;
    }
    Some(&values[t + 1 - window..=t])
}
