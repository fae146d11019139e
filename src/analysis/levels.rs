//! Price levels: classic pivot support/resistance, trailing period highs/lows, Fibonacci
//! retracements and the volume-profile point of control.

use serde::{Deserialize, Serialize};

use crate::config::ANALYSIS;
use crate::domain::{Period, Series};
use crate::error::{AnalyticsError, Result};
use crate::utils::maths_utils::{RangeF64, finite, first_argmax, get_max, get_min, round2};

/// Tunable inputs for Fibonacci and POC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub fibonacci_lookback: Period,
    pub poc_bins: usize,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            fibonacci_lookback: ANALYSIS.levels.fibonacci_lookback,
            poc_bins: ANALYSIS.levels.poc_bins,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resistance {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

/// Highest high / lowest low over trailing windows. A window made entirely of unusable
/// values leaves its pair empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodHighsLows {
    pub high_1m: Option<f64>,
    pub low_1m: Option<f64>,
    pub high_6m: Option<f64>,
    pub low_6m: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub pivot: f64,
    pub resistance: Resistance,
    pub support: Support,
    pub period_highs_lows: PeriodHighsLows,
}

/// Trailing extreme over the last `count` bars, rounded.
fn finite_extreme(values: &[f64], pick: fn(&[f64]) -> Option<f64>) -> Option<f64> {
    let window: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    pick(&window)
}

fn trailing_extreme(values: &[f64], count: usize, pick: fn(&[f64]) -> Option<f64>) -> Option<f64> {
    let start = values.len().saturating_sub(count);
    finite_extreme(&values[start..], pick).map(round2)
}

/// Classic floor-trader pivots from the last bar plus period highs/lows.
/// `None` below the bar floor or when the last bar's high/low/close is unusable.
pub fn compute_support_resistance(series: &Series) -> Option<SupportResistance> {
    let cfg = &ANALYSIS.levels;
    if !series.has_even_columns() {
        return None;
    }
    if series.len() < cfg.min_bars_for_pivots {
        log::debug!(
            "{}: {} bars, pivots need {}",
            series.symbol,
            series.len(),
            cfg.min_bars_for_pivots
        );
        return None;
    }

    let last_bar = series.get_bar(series.len() - 1);
    let high = round2(finite(last_bar.high)?);
    let low = round2(finite(last_bar.low)?);
    let close = round2(finite(last_bar.close)?);

    let pivot = round2((high + low + close) / 3.0);
    let range = high - low;

    let resistance = Resistance {
        r1: round2(2.0 * pivot - low),
        r2: round2(pivot + range),
        r3: round2(high + 2.0 * (pivot - low)),
    };
    let support = Support {
        s1: round2(2.0 * pivot - high),
        s2: round2(pivot - range),
        s3: round2(low - 2.0 * (high - pivot)),
    };

    let highs = &series.high_prices;
    let lows = &series.low_prices;
    let year_window = series.len().min(cfg.fifty_two_week_bars);
    let period_highs_lows = PeriodHighsLows {
        high_1m: trailing_extreme(highs, cfg.one_month_bars, get_max),
        low_1m: trailing_extreme(lows, cfg.one_month_bars, get_min),
        high_6m: trailing_extreme(highs, cfg.six_month_bars, get_max),
        low_6m: trailing_extreme(lows, cfg.six_month_bars, get_min),
        high_52w: trailing_extreme(highs, year_window, get_max),
        low_52w: trailing_extreme(lows, year_window, get_min),
    };

    Some(SupportResistance {
        pivot,
        resistance,
        support,
        period_highs_lows,
    })
}

// ============================================================================
// Fibonacci retracements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    /// Retracement ratio in percent (23.6, 38.2, ...).
    pub ratio_pct: f64,
    pub price: f64,
}

/// Retracement prices ordered from the swing high (0%) down to the swing low (100%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    pub levels: Vec<FibonacciLevel>,
}

impl FibonacciLevels {
    pub fn level(&self, ratio_pct: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio_pct - ratio_pct).abs() < 1e-9)
            .map(|l| l.price)
    }
}

/// Retracements between the highest high and lowest low of the trailing `lookback` bars
/// (all bars when fewer are available). `None` for a degenerate swing.
pub fn compute_fibonacci(series: &Series, lookback: Period) -> Option<FibonacciLevels> {
    let cfg = &ANALYSIS.levels;
    if series.len() < cfg.min_bars_for_fibonacci || !series.has_even_columns() {
        return None;
    }

    let (start, end) = series.get_indices_most_recent(lookback.get());
    let swing_high = finite_extreme(&series.high_prices[start..end], get_max)?;
    let swing_low = finite_extreme(&series.low_prices[start..end], get_min)?;
    if swing_high == swing_low {
        return None;
    }

    // Levels come from the raw swing; only stored values are rounded
    let diff = swing_high - swing_low;
    let levels = cfg
        .fibonacci_ratios
        .iter()
        .map(|&ratio| FibonacciLevel {
            ratio_pct: (ratio * 1000.0).round() / 10.0,
            price: round2(swing_high - ratio * diff),
        })
        .collect();

    Some(FibonacciLevels {
        swing_high: round2(swing_high),
        swing_low: round2(swing_low),
        levels,
    })
}

// ============================================================================
// Volume profile
// ============================================================================

/// Midpoint of the price bucket holding the most traded volume.
///
/// Closes are bucketed into `bins` equal-width intervals spanning the lowest low to the
/// highest high of the usable bars. `Ok(None)` when fewer than the minimum bars carry both a
/// close and a volume, or when the price range collapses to a point. Zero bins or ragged
/// columns are an error.
pub fn compute_volume_poc(series: &Series, bins: usize) -> Result<Option<f64>> {
    if bins == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "volume profile needs at least one bin".to_string(),
        ));
    }
    series.check_columns()?;

    let usable: Vec<usize> = (0..series.len())
        .filter(|&i| series.close_prices[i].is_finite() && series.volumes[i].is_finite())
        .collect();
    if usable.len() < ANALYSIS.levels.min_bars_for_poc {
        log::debug!(
            "{}: {} usable bars, POC needs {}",
            series.symbol,
            usable.len(),
            ANALYSIS.levels.min_bars_for_poc
        );
        return Ok(None);
    }

    let lows: Vec<f64> = usable
        .iter()
        .map(|&i| series.low_prices[i])
        .filter(|v| v.is_finite())
        .collect();
    let highs: Vec<f64> = usable
        .iter()
        .map(|&i| series.high_prices[i])
        .filter(|v| v.is_finite())
        .collect();
    let (Some(min_price), Some(max_price)) = (get_min(&lows), get_max(&highs)) else {
        return Ok(None);
    };
    if min_price >= max_price {
        return Ok(None);
    }

    let range = RangeF64::new(min_price, max_price, bins);
    let mut volume_by_bucket = vec![0.0; range.n_chunks()];
    for &i in &usable {
        volume_by_bucket[range.chunk_index(series.close_prices[i])] += series.volumes[i];
    }

    Ok(first_argmax(&volume_by_bucket).and_then(|idx| finite(round2(range.chunk_mid(idx)))))
}
