use argminmax::ArgMinMax;
use std::f64;

use crate::domain::Period;

/// `Some(x)` when `x` is a usable number. NaN and +/-inf become `None`.
#[inline]
pub fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

/// Round half away from zero to `dp` decimal places.
#[inline]
pub fn round_dp(x: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (x * factor).round() / factor
}

/// Two-decimal rounding used for every price-like output.
#[inline]
pub fn round2(x: f64) -> f64 {
    round_dp(x, 2)
}

/// Equal-width bucketing of a closed price interval.
#[derive(serde::Deserialize, serde::Serialize, Default, Debug, Clone, PartialEq)]
pub struct RangeF64 {
    pub start_range: f64,
    pub end_range: f64,
    pub n_chunks: usize,
}

impl RangeF64 {
    pub fn new(start_range: f64, end_range: f64, n_chunks: usize) -> Self {
        debug_assert!(n_chunks > 0);
        RangeF64 {
            start_range,
            end_range,
            n_chunks,
        }
    }

    #[inline]
    pub fn n_chunks(&self) -> usize {
        self.n_chunks
    }

    pub fn range_length(&self) -> f64 {
        self.end_range - self.start_range
    }

    pub fn chunk_size(&self) -> f64 {
        self.range_length() / (self.n_chunks as f64)
    }

    pub fn chunk_index(&self, value: f64) -> usize {
        let index = (value - self.start_range) / self.chunk_size();
        // Negative and NaN casts saturate to 0
        let chunk_index = index as usize;

        // Clamping handles floating-point inaccuracies at the boundary.
        chunk_index.min(self.n_chunks - 1)
    }

    pub fn chunk_bounds(&self, chunk_index: usize) -> (f64, f64) {
        debug_assert!(chunk_index < self.n_chunks);
        let lower_bound = self.start_range + chunk_index as f64 * self.chunk_size();
        let upper_bound = self.start_range + (chunk_index + 1) as f64 * self.chunk_size();
        (lower_bound, upper_bound)
    }

    pub fn chunk_mid(&self, chunk_index: usize) -> f64 {
        let (lo, hi) = self.chunk_bounds(chunk_index);
        (lo + hi) / 2.0
    }
}

/// Largest non-NaN value. `None` for an empty or all-NaN slice.
pub fn get_max(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    let max_index: usize = vec.argmax();
    finite(vec[max_index])
}

/// Smallest non-NaN value. `None` for an empty or all-NaN slice.
pub fn get_min(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    let min_index: usize = vec.argmin();
    finite(vec[min_index])
}

/// Index of the first maximum. Ties go to the lowest index.
pub fn first_argmax(vec: &[f64]) -> Option<usize> {
    vec.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Simple rolling mean. Position `i` is `Some` only when the whole window ending at `i`
/// holds finite values.
pub fn rolling_mean(values: &[Option<f64>], period: Period) -> Vec<Option<f64>> {
    let p = period.get();
    let mut out = vec![None; values.len()];
    if values.len() < p {
        return out;
    }
    for (end, slot) in out.iter_mut().enumerate().skip(p - 1) {
        let window = &values[end + 1 - p..=end];
        let mut sum = 0.0;
        let mut complete = true;
        for v in window {
            match v {
                Some(x) if x.is_finite() => sum += x,
                _ => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            *slot = finite(sum / p as f64);
        }
    }
    out
}

/// Rolling sample standard deviation (n - 1 denominator). Needs at least 2 bars per window.
pub fn rolling_std(values: &[Option<f64>], period: Period) -> Vec<Option<f64>> {
    let p = period.get();
    let mut out = vec![None; values.len()];
    if p < 2 || values.len() < p {
        return out;
    }
    for (end, slot) in out.iter_mut().enumerate().skip(p - 1) {
        let window: Option<Vec<f64>> = values[end + 1 - p..=end]
            .iter()
            .map(|v| v.and_then(finite))
            .collect();
        if let Some(w) = window {
            let mean = w.iter().sum::<f64>() / p as f64;
            let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (p - 1) as f64;
            *slot = finite(var.sqrt());
        }
    }
    out
}

/// Exponentially weighted mean in span form (alpha = 2 / (span + 1)), with weights
/// normalised over all history seen so far. Defined from the first value onwards.
/// Non-finite inputs are skipped, leaving the running weights untouched.
///
/// Uses the incremental form `y += (x - y) / total_weight`, so a constant input stays
/// exactly constant.
pub fn ewm_mean(values: &[f64], span: Period) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span.get() as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut total_weight = 0.0;
    let mut mean: Option<f64> = None;
    values
        .iter()
        .map(|&x| {
            if x.is_finite() {
                total_weight = 1.0 + decay * total_weight;
                mean = Some(match mean {
                    Some(y) => y + (x - y) / total_weight,
                    None => x,
                });
            }
            mean
        })
        .collect()
}

/// Wrap a plain column so it can feed the rolling helpers.
pub fn as_optional(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| finite(v)).collect()
}

/// Arithmetic mean of the finite values in the last `count` entries.
pub fn tail_mean(values: &[f64], count: usize) -> Option<f64> {
    let start = values.len().saturating_sub(count);
    let tail: Vec<f64> = values[start..].iter().copied().filter(|v| v.is_finite()).collect();
    if tail.is_empty() {
        return None;
    }
    finite(tail.iter().sum::<f64>() / tail.len() as f64)
}
