//! Indicator engine: RSI, MACD, ADX/DI, ATR, SMA/EMA and Bollinger Bands.
//!
//! Every series function returns one slot per input bar. A slot is `None` until its window
//! is full, and also whenever the arithmetic degenerates (zero range, zero average loss and
//! gain...), so no NaN or infinity ever reaches a caller.

use serde::{Deserialize, Serialize};

use crate::config::{ANALYSIS, DEBUG_FLAGS};
use crate::domain::{Period, Series};
use crate::error::{AnalyticsError, Result};
use crate::utils::maths_utils::{as_optional, ewm_mean, finite, round2, rolling_mean, rolling_std};

// ============================================================================
// Parameters
// ============================================================================

/// Window lengths for a snapshot. `Default` uses the engine-wide defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_period: Period,
    pub adx_period: Period,
    pub atr_period: Period,
    pub sma_short: Period,
    pub sma_medium: Period,
    pub sma_long: Period,
    pub ema_period: Period,
    pub bollinger_period: Period,
    pub bollinger_std_mult: f64,
    pub macd_fast: Period,
    pub macd_slow: Period,
    pub macd_signal: Period,
    pub volume_avg_period: Period,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        let cfg = &ANALYSIS.indicators;
        Self {
            rsi_period: cfg.rsi_period,
            adx_period: cfg.adx_period,
            atr_period: cfg.atr_period,
            sma_short: cfg.sma_short,
            sma_medium: cfg.sma_medium,
            sma_long: cfg.sma_long,
            ema_period: cfg.ema_period,
            bollinger_period: cfg.bollinger_period,
            bollinger_std_mult: cfg.bollinger_std_mult,
            macd_fast: cfg.macd_fast,
            macd_slow: cfg.macd_slow,
            macd_signal: cfg.macd_signal,
            volume_avg_period: cfg.volume_avg_period,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<()> {
        if !self.bollinger_std_mult.is_finite() || self.bollinger_std_mult <= 0.0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "bollinger_std_mult must be a positive number, got {}",
                self.bollinger_std_mult
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalyticsError::InvalidParameter(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Labels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiSignal {
    pub fn classify(rsi: f64) -> Self {
        let cfg = &ANALYSIS.indicators;
        if rsi > cfg.rsi_overbought {
            RsiSignal::Overbought
        } else if rsi < cfg.rsi_oversold {
            RsiSignal::Oversold
        } else {
            RsiSignal::Neutral
        }
    }
}

/// MACD line vs signal line. A tie reads as `Bearish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum MacdSignal {
    Bullish,
    Bearish,
}

impl MacdSignal {
    pub fn classify(line: f64, signal_line: f64) -> Self {
        if line > signal_line {
            MacdSignal::Bullish
        } else {
            MacdSignal::Bearish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum BandSignal {
    Overbought,
    Oversold,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum PriceVsAverage {
    Above,
    Below,
}

// ============================================================================
// Series functions
// ============================================================================

pub fn sma(values: &[f64], period: Period) -> Vec<Option<f64>> {
    rolling_mean(&as_optional(values), period)
}

pub fn ema(values: &[f64], span: Period) -> Vec<Option<f64>> {
    ewm_mean(values, span)
}

/// Bar-to-bar change; slot 0 is always `None`.
fn diffs(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| finite(w[1] - w[0])));
    out
}

/// RSI with simple rolling averages of gains and losses over `period` bars.
///
/// The first bar has no previous close and counts as no change, so the first value lands
/// at index `period - 1`. Zero average loss with positive average gain saturates at 100. A
/// window without any movement at all (0 / 0) is absent.
pub fn rsi(closes: &[f64], period: Period) -> Vec<Option<f64>> {
    let mut delta = diffs(closes);
    if let Some(first) = delta.first_mut() {
        *first = Some(0.0);
    }
    let gains: Vec<Option<f64>> = delta.iter().map(|d| d.map(|x| x.max(0.0))).collect();
    let losses: Vec<Option<f64>> = delta.iter().map(|d| d.map(|x| (-x).max(0.0))).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| match (*g, *l) {
            (Some(g), Some(l)) if l > 0.0 => finite(100.0 - 100.0 / (1.0 + g / l)),
            (Some(g), Some(_)) if g > 0.0 => Some(100.0),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd(closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries {
    let fast_ema = ewm_mean(closes, fast);
    let slow_ema = ewm_mean(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some(f.as_ref()? - s.as_ref()?))
        .collect();

    // EWM of the line; absent slots contribute nothing
    let line_values: Vec<f64> = line.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    let signal_line = ewm_mean(&line_values, signal);

    let histogram = line
        .iter()
        .zip(signal_line.iter())
        .map(|(l, s)| finite(l.as_ref()? - s.as_ref()?))
        .collect();

    MacdSeries {
        line,
        signal_line,
        histogram,
    }
}

/// True range per bar. The first bar has no previous close and uses high - low.
pub fn true_range(series: &Series) -> Vec<Option<f64>> {
    let mut prev_close = None;
    series
        .bars()
        .map(|bar| {
            let tr = bar.true_range(prev_close);
            prev_close = Some(bar.close);
            finite(tr)
        })
        .collect()
}

/// Average True Range: simple rolling mean of the true range.
pub fn atr(series: &Series, period: Period) -> Vec<Option<f64>> {
    rolling_mean(&true_range(series), period)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionalSeries {
    pub atr: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
    pub dx: Vec<Option<f64>>,
    pub adx: Vec<Option<f64>>,
}

/// +DI, -DI, DX and ADX.
///
/// +DM is the upward high-to-high move and -DM the downward low-to-low move, each clipped
/// at zero on its own. Smoothing is a simple rolling mean throughout.
pub fn directional_index(series: &Series, period: Period) -> DirectionalSeries {
    let highs = &series.high_prices;
    let lows = &series.low_prices;

    let plus_dm: Vec<Option<f64>> = diffs(highs).iter().map(|d| d.map(|x| x.max(0.0))).collect();
    let minus_dm: Vec<Option<f64>> = diffs(lows)
        .iter()
        .map(|d| d.map(|x| (-x).max(0.0)))
        .collect();

    let atr = atr(series, period);
    let smoothed_plus = rolling_mean(&plus_dm, period);
    let smoothed_minus = rolling_mean(&minus_dm, period);

    let di = |dm: &[Option<f64>]| -> Vec<Option<f64>> {
        dm.iter()
            .zip(atr.iter())
            .map(|(dm, atr)| match (*dm, *atr) {
                (Some(dm), Some(atr)) if atr > 0.0 => finite(100.0 * dm / atr),
                _ => None,
            })
            .collect()
    };
    let plus_di = di(&smoothed_plus);
    let minus_di = di(&smoothed_minus);

    let dx: Vec<Option<f64>> = plus_di
        .iter()
        .zip(minus_di.iter())
        .map(|(p, m)| match (*p, *m) {
            (Some(p), Some(m)) if p + m > 0.0 => finite(100.0 * (p - m).abs() / (p + m)),
            _ => None,
        })
        .collect();
    let adx = rolling_mean(&dx, period);

    DirectionalSeries {
        atr,
        plus_di,
        minus_di,
        dx,
        adx,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// SMA middle band, +/- `std_mult` rolling sample standard deviations.
pub fn bollinger(closes: &[f64], period: Period, std_mult: f64) -> BollingerSeries {
    let values = as_optional(closes);
    let middle = rolling_mean(&values, period);
    let std = rolling_std(&values, period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(std.iter())
            .map(|(m, s)| finite(m.as_ref()? + sign * std_mult * s.as_ref()?))
            .collect()
    };

    BollingerSeries {
        upper: band(1.0),
        lower: band(-1.0),
        middle,
    }
}

// ============================================================================
// Snapshot (latest-bar values)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub signal: MacdSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub signal: BandSignal,
}

/// Latest-bar indicator values. Every field is independently optional; a series below the
/// snapshot floor yields the all-`None` default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub rsi_signal: Option<RsiSignal>,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub atr: Option<f64>,
    pub macd: Option<MacdReading>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub ema20: Option<f64>,
    pub bollinger: Option<BollingerReading>,
    pub volume_avg: Option<f64>,
    pub price_vs_sma20: Option<PriceVsAverage>,
}

impl IndicatorSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == IndicatorSnapshot::default()
    }

    pub fn macd_signal(&self) -> Option<MacdSignal> {
        self.macd.map(|m| m.signal)
    }

    pub fn bollinger_signal(&self) -> Option<BandSignal> {
        self.bollinger.map(|b| b.signal)
    }
}

fn last(values: &[Option<f64>]) -> Option<f64> {
    values.last().copied().flatten()
}

/// Snapshot with the default windows.
pub fn compute_snapshot(series: &Series) -> IndicatorSnapshot {
    build_snapshot(series, &IndicatorParams::default())
}

/// Snapshot with caller-chosen windows. Only malformed parameters fail.
pub fn compute_snapshot_with(series: &Series, params: &IndicatorParams) -> Result<IndicatorSnapshot> {
    params.validate()?;
    Ok(build_snapshot(series, params))
}

fn build_snapshot(series: &Series, params: &IndicatorParams) -> IndicatorSnapshot {
    if !series.has_even_columns() {
        return IndicatorSnapshot::default();
    }
    if series.len() < ANALYSIS.indicators.min_bars_for_snapshot {
        log::debug!(
            "{}: {} bars is below the snapshot floor of {}",
            series.symbol,
            series.len(),
            ANALYSIS.indicators.min_bars_for_snapshot
        );
        return IndicatorSnapshot::default();
    }

    let closes = &series.close_prices;
    let current_price = series.last_close().and_then(finite);

    let rsi_value = last(&rsi(closes, params.rsi_period));

    let macd_series = macd(closes, params.macd_fast, params.macd_slow, params.macd_signal);
    let macd_reading = match (
        last(&macd_series.line),
        last(&macd_series.signal_line),
        last(&macd_series.histogram),
    ) {
        (Some(line), Some(signal_line), Some(histogram)) => Some(MacdReading {
            line: round2(line),
            signal_line: round2(signal_line),
            histogram: round2(histogram),
            signal: MacdSignal::classify(line, signal_line),
        }),
        _ => None,
    };

    let sma20 = last(&sma(closes, params.sma_short));
    let sma50 = last(&sma(closes, params.sma_medium));
    let sma200 = last(&sma(closes, params.sma_long));
    let ema20 = last(&ema(closes, params.ema_period));

    let bands = bollinger(closes, params.bollinger_period, params.bollinger_std_mult);
    let bollinger_reading = match (last(&bands.upper), last(&bands.middle), last(&bands.lower)) {
        (Some(upper), Some(middle), Some(lower)) => {
            let signal = match current_price {
                Some(p) if p > upper => BandSignal::Overbought,
                Some(p) if p < lower => BandSignal::Oversold,
                _ => BandSignal::Normal,
            };
            Some(BollingerReading {
                upper: round2(upper),
                middle: round2(middle),
                lower: round2(lower),
                signal,
            })
        }
        _ => None,
    };

    let directional = directional_index(series, params.adx_period);
    let atr_value = if params.atr_period == params.adx_period {
        last(&directional.atr)
    } else {
        last(&atr(series, params.atr_period))
    };

    let volume_avg = last(&sma(&series.volumes, params.volume_avg_period));

    let price_vs_sma20 = match (current_price, sma20) {
        (Some(p), Some(s)) if p > s => Some(PriceVsAverage::Above),
        (Some(_), Some(_)) => Some(PriceVsAverage::Below),
        _ => None,
    };

    let snapshot = IndicatorSnapshot {
        rsi: rsi_value.map(round2),
        rsi_signal: rsi_value.map(RsiSignal::classify),
        adx: last(&directional.adx).map(round2),
        plus_di: last(&directional.plus_di).map(round2),
        minus_di: last(&directional.minus_di).map(round2),
        atr: atr_value.map(round2),
        macd: macd_reading,
        sma20: sma20.map(round2),
        sma50: sma50.map(round2),
        sma200: sma200.map(round2),
        ema20: ema20.map(round2),
        bollinger: bollinger_reading,
        volume_avg: volume_avg.map(round2),
        price_vs_sma20,
    };

    if !DEBUG_FLAGS.print_indicators_for_symbol.is_empty()
        && DEBUG_FLAGS.print_indicators_for_symbol == series.symbol
    {
        log::info!("{} indicators: {:?}", series.symbol, snapshot);
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;

    fn p(n: usize) -> Period {
        Period::new(n).unwrap()
    }

    /// Deterministic wavy series: trend plus a sine so both gains and losses appear.
    fn wavy_series(n: usize, slope: f64) -> Series {
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| {
                let x = i as f64;
                let close = 100.0 + slope * x + 3.0 * (x * 0.7).sin();
                let open = close - 0.5 * (x * 1.3).cos();
                let high = open.max(close) + 1.0 + 0.3 * (x * 0.4).sin().abs();
                let low = open.min(close) - 1.0 - 0.2 * (x * 0.9).cos().abs();
                PriceBar::new(i as i64 * 86_400_000, open, high, low, close, 1_000.0 + 10.0 * x)
            })
            .collect();
        Series::from_bars("WAVY", &bars)
    }

    fn flat_series(n: usize, price: f64) -> Series {
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| PriceBar::new(i as i64, price, price, price, price, 100_000.0))
            .collect();
        Series::from_bars("FLAT", &bars)
    }

    #[test]
    fn test_short_series_gives_empty_snapshot() {
        let snapshot = compute_snapshot(&wavy_series(19, 0.5));
        assert!(snapshot.is_empty());
        assert!(compute_snapshot(&Series::default()).is_empty());
    }

    #[test]
    fn test_rsi_stays_in_bounds() {
        for slope in [-2.0, -0.3, 0.0, 0.3, 2.0] {
            let series = wavy_series(120, slope);
            for v in rsi(&series.close_prices, p(14)).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&v), "rsi {} out of range", v);
            }
        }
    }

    #[test]
    fn test_rsi_saturates_on_pure_gains_and_is_absent_when_flat() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&rising, p(14)).last().copied().flatten(), Some(100.0));

        let flat = vec![50.0; 30];
        assert_eq!(rsi(&flat, p(14)).last().copied().flatten(), None);

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi(&falling, p(14)).last().copied().flatten(), Some(0.0));
    }

    #[test]
    fn test_rsi_first_value_lands_at_period_minus_one() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let out = rsi(&closes, p(14));
        assert!(out[12].is_none());
        assert!(out[13].is_some());

        // The first bar's missing change counts as zero in both averages
        let rising: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&rising, p(14))[13], Some(100.0));
        let mixed = [10.0, 11.0, 10.0];
        // gains 0 + 1 + 0, losses 0 + 0 + 1
        assert_eq!(rsi(&mixed, p(3))[2], Some(50.0));
    }

    #[test]
    fn test_macd_signal_labels() {
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let m = macd(&rising, p(12), p(26), p(9));
        let line = m.line.last().copied().flatten().unwrap();
        let sig = m.signal_line.last().copied().flatten().unwrap();
        assert!(line > 0.0);
        assert_eq!(MacdSignal::classify(line, sig), MacdSignal::Bullish);
        // Ties resolve to Bearish
        assert_eq!(MacdSignal::classify(1.0, 1.0), MacdSignal::Bearish);
    }

    #[test]
    fn test_bollinger_ordering() {
        let series = wavy_series(80, 0.4);
        let bands = bollinger(&series.close_prices, p(20), 2.0);
        for i in 0..series.len() {
            if let (Some(u), Some(m), Some(l)) = (bands.upper[i], bands.middle[i], bands.lower[i]) {
                assert!(u >= m && m >= l);
            }
        }
        assert!(bands.middle[18].is_none());
        assert!(bands.middle[19].is_some());
    }

    #[test]
    fn test_directional_index_bounds_and_warmup() {
        let series = wavy_series(100, 2.0);
        let d = directional_index(&series, p(14));
        assert!(d.atr[12].is_none() && d.atr[13].is_some());
        assert!(d.plus_di[13].is_none() && d.plus_di[14].is_some());
        assert!(d.adx[26].is_none() && d.adx[27].is_some());
        for v in d.adx.iter().flatten() {
            assert!((0.0..=100.0).contains(v));
        }
        // A steady uptrend keeps +DI above -DI
        let last_plus = d.plus_di.last().copied().flatten().unwrap();
        let last_minus = d.minus_di.last().copied().flatten().unwrap();
        assert!(last_plus > last_minus);
    }

    #[test]
    fn test_flat_series_has_no_directional_values() {
        let series = flat_series(40, 500.0);
        let snapshot = compute_snapshot(&series);
        assert_eq!(snapshot.atr, Some(0.0));
        assert_eq!(snapshot.plus_di, None);
        assert_eq!(snapshot.adx, None);
        assert_eq!(snapshot.rsi, None);
        assert_eq!(snapshot.macd_signal(), Some(MacdSignal::Bearish));
        assert_eq!(snapshot.bollinger_signal(), Some(BandSignal::Normal));
        assert_eq!(snapshot.price_vs_sma20, Some(PriceVsAverage::Below));
    }

    #[test]
    fn test_snapshot_fields_follow_window_lengths() {
        let snapshot = compute_snapshot(&wavy_series(60, 0.5));
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.rsi_signal.is_some());
        assert!(snapshot.sma20.is_some());
        assert!(snapshot.sma50.is_some());
        assert!(snapshot.sma200.is_none());
        assert!(snapshot.ema20.is_some());
        assert!(snapshot.volume_avg.is_some());
        let bb = snapshot.bollinger.unwrap();
        assert!(bb.upper >= bb.middle && bb.middle >= bb.lower);

        let long = compute_snapshot(&wavy_series(220, 0.5));
        assert!(long.sma200.is_some());
        assert!(long.adx.is_some());
    }

    #[test]
    fn test_nan_close_inside_windows_blanks_close_based_fields() {
        let mut series = wavy_series(120, 0.5);
        series.close_prices[110] = f64::NAN;
        let snapshot = compute_snapshot(&series);

        assert_eq!(snapshot.rsi, None);
        assert_eq!(snapshot.rsi_signal, None);
        assert_eq!(snapshot.sma20, None);
        assert_eq!(snapshot.sma50, None);
        assert_eq!(snapshot.bollinger, None);
        assert_eq!(snapshot.price_vs_sma20, None);

        // EWM-based readings skip the gap; bar ranges and volumes are untouched
        assert!(snapshot.macd.is_some());
        assert!(snapshot.ema20.is_some());
        assert!(snapshot.atr.is_some());
        assert!(snapshot.adx.is_some());
        assert!(snapshot.volume_avg.is_some());
    }

    #[test]
    fn test_nan_close_outside_windows_is_harmless() {
        let mut series = wavy_series(120, 0.5);
        series.close_prices[5] = f64::NAN;
        let snapshot = compute_snapshot(&series);
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.sma20.is_some());
        assert!(snapshot.sma50.is_some());
        assert!(snapshot.bollinger.is_some());
        assert!(snapshot.macd.is_some());
    }

    #[test]
    fn test_non_finite_high_and_volume() {
        let mut series = wavy_series(120, 0.5);
        series.high_prices[115] = f64::INFINITY;
        series.volumes[117] = f64::NAN;
        let snapshot = compute_snapshot(&series);

        assert_eq!(snapshot.atr, None);
        assert_eq!(snapshot.plus_di, None);
        assert_eq!(snapshot.volume_avg, None);
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.sma20.is_some());
        assert!(snapshot.bollinger.is_some());
    }

    #[test]
    fn test_rsi_labels() {
        assert_eq!(RsiSignal::classify(75.0), RsiSignal::Overbought);
        assert_eq!(RsiSignal::classify(25.0), RsiSignal::Oversold);
        assert_eq!(RsiSignal::classify(70.0), RsiSignal::Neutral);
    }

    #[test]
    fn test_params_validation() {
        let mut params = IndicatorParams::default();
        assert!(params.validate().is_ok());
        params.bollinger_std_mult = 0.0;
        assert!(matches!(
            compute_snapshot_with(&wavy_series(40, 0.1), &params),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        let mut params = IndicatorParams::default();
        params.macd_fast = p(30);
        assert!(params.validate().is_err());
    }
}
