//! Numeric primitives shared by the summarizer and aggregator.
//!
//! All three are total: empty input and degenerate ranges produce `0.0`
//! instead of `NaN` or a panic.

use std::cmp::Ordering;

/// Arithmetic mean; `0.0` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Median of `xs`; mean of the two middle values for even lengths, `0.0` when empty.
#[must_use]
pub fn median(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Clamp `value` to `[min, max]` and rescale linearly onto `[0, 100]`.
///
/// Returns `0.0` when the range is degenerate (`max <= min`) or not comparable.
#[must_use]
pub fn normalize_to_100(value: f64, min: f64, max: f64) -> f64 {
    if max.partial_cmp(&min) != Some(Ordering::Greater) {
        return 0.0;
    }
    let clamped = if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    };
    (clamped - min) / (max - min) * 100.0
}
