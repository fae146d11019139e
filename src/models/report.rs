use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::breakout::{BreakoutResult, scan_breakout};
use crate::analysis::indicators::{IndicatorParams, IndicatorSnapshot, compute_snapshot_with};
use crate::analysis::levels::{
    FibonacciLevels, LevelParams, SupportResistance, compute_fibonacci,
    compute_support_resistance, compute_volume_poc,
};
use crate::analysis::regime::{RegimeResult, detect_market_regime};
use crate::analysis::signal_scoring::{SignalScore, score_snapshot};
use crate::domain::{Chain, Series};
use crate::error::Result;
use crate::options::{ContractGreeks, OiSummary, analyse_oi, calculate_max_pain, chain_greeks};
use crate::utils::maths_utils::{finite, round2};
use crate::utils::time_utils::epoch_ms_to_utc;

// ============================================================================
// AnalyticsReport: everything the engine can say about one series
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub symbol: String,
    pub bars: usize,
    pub last_date: Option<String>,
    pub current_price: Option<f64>,
    pub indicators: IndicatorSnapshot,
    pub support_resistance: Option<SupportResistance>,
    pub fibonacci: Option<FibonacciLevels>,
    pub volume_poc: Option<f64>,
    pub regime: RegimeResult,
    pub breakout: Option<BreakoutResult>,
    /// Only present once the indicator snapshot has data.
    pub recommendation: Option<SignalScore>,
    pub options: Option<OptionsReport>,
}

/// Report with the default windows and bin count.
pub fn build_report(series: &Series) -> Result<AnalyticsReport> {
    build_report_with(series, &IndicatorParams::default(), &LevelParams::default())
}

/// Report with caller-chosen parameters. Only malformed parameters or a series with
/// columns of different lengths fail.
pub fn build_report_with(
    series: &Series,
    indicators: &IndicatorParams,
    levels: &LevelParams,
) -> Result<AnalyticsReport> {
    series.check_columns()?;
    let snapshot = compute_snapshot_with(series, indicators)?;
    let volume_poc = compute_volume_poc(series, levels.poc_bins)?;

    let malformed = series.validate();
    if malformed > 0 {
        log::warn!("{}: {} malformed bars in input", series.symbol, malformed);
    }

    let support_resistance = compute_support_resistance(series);
    let breakout = scan_breakout(series, support_resistance.as_ref(), &snapshot);
    let recommendation = (!snapshot.is_empty()).then(|| score_snapshot(&snapshot));

    Ok(AnalyticsReport {
        symbol: series.symbol.clone(),
        bars: series.len(),
        last_date: series.last_timestamp_ms().map(epoch_ms_to_utc),
        current_price: series.last_close().and_then(finite).map(round2),
        support_resistance,
        fibonacci: compute_fibonacci(series, levels.fibonacci_lookback),
        volume_poc,
        regime: detect_market_regime(series),
        breakout,
        recommendation,
        indicators: snapshot,
        options: None,
    })
}

// ============================================================================
// OptionsReport: max pain, OI sentiment and Greeks for one expiry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsReport {
    pub underlying: String,
    pub spot: f64,
    /// Expiry the figures were computed for. `None` when the chain carries no dates.
    pub expiry: Option<NaiveDate>,
    pub available_expiries: Vec<NaiveDate>,
    pub max_pain: Option<f64>,
    pub open_interest: OiSummary,
    pub greeks: Vec<ContractGreeks>,
}

/// Options figures for `expiry`, or the nearest expiry when none is given.
/// A chain without expiry dates is analysed as a whole (and gets no Greeks).
pub fn build_options_report(
    chain: &Chain,
    valuation: NaiveDate,
    expiry: Option<NaiveDate>,
    risk_free_rate: f64,
) -> Result<OptionsReport> {
    let available_expiries = chain.expiries();
    let expiry = expiry.or_else(|| chain.nearest_expiry());
    let selected = match expiry {
        Some(date) => chain.for_expiry(date),
        None => chain.clone(),
    };
    if selected.is_empty() {
        log::warn!(
            "{}: no contracts for expiry {:?}",
            chain.underlying,
            expiry
        );
    }

    Ok(OptionsReport {
        underlying: chain.underlying.clone(),
        spot: chain.spot,
        expiry,
        available_expiries,
        max_pain: calculate_max_pain(&selected.contracts),
        open_interest: analyse_oi(&selected.contracts),
        greeks: chain_greeks(&selected, valuation, risk_free_rate)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::regime::Regime;
    use crate::config::OPTIONS;
    use crate::domain::{OptionContract, OptionType, Period, PriceBar};
    use crate::error::AnalyticsError;

    fn series(n: usize) -> Series {
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| {
                let x = i as f64;
                let c = 150.0 + 0.4 * x + 5.0 * (x * 0.3).sin();
                PriceBar::new(
                    1_700_000_000_000 + i as i64 * 86_400_000,
                    c - 0.5,
                    c + 1.5,
                    c - 1.5,
                    c,
                    10_000.0 + 100.0 * (x * 0.2).cos(),
                )
            })
            .collect();
        Series::from_bars("REPORT", &bars)
    }

    #[test]
    fn test_full_report() {
        let report = build_report(&series(250)).unwrap();
        assert_eq!(report.bars, 250);
        assert!(report.last_date.is_some());
        assert!(report.indicators.sma200.is_some());
        assert!(report.support_resistance.is_some());
        assert!(report.fibonacci.is_some());
        assert!(report.volume_poc.is_some());
        assert_ne!(report.regime.regime, Regime::Unknown);
        assert!(report.recommendation.is_some());
        assert!(report.options.is_none());
    }

    #[test]
    fn test_short_series_report_is_mostly_empty() {
        let report = build_report(&series(8)).unwrap();
        assert!(report.indicators.is_empty());
        assert!(report.recommendation.is_none());
        assert!(report.support_resistance.is_some());
        assert!(report.volume_poc.is_none());
        assert_eq!(report.regime.regime, Regime::Unknown);
        assert!(report.breakout.is_none());
    }

    #[test]
    fn test_bad_parameters_fail_fast() {
        let levels = LevelParams {
            fibonacci_lookback: Period::of(60),
            poc_bins: 0,
        };
        assert!(matches!(
            build_report_with(&series(100), &IndicatorParams::default(), &levels),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_ragged_series_is_an_error_not_a_panic() {
        let mut ragged = series(30);
        ragged.volumes.pop();
        assert!(matches!(
            build_report(&ragged),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        assert!(compute_support_resistance(&ragged).is_none());
        assert_eq!(detect_market_regime(&ragged).regime, Regime::Unknown);
        assert!(compute_volume_poc(&ragged, 20).is_err());
    }

    #[test]
    fn test_options_report_picks_nearest_expiry() {
        let near = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let far = NaiveDate::from_ymd_opt(2025, 2, 27).unwrap();
        let mut contracts = Vec::new();
        for (strike, call_oi, put_oi) in [(480.0, 100, 4_000), (500.0, 2_000, 2_000), (520.0, 5_000, 100)] {
            contracts.push(
                OptionContract::new(strike, OptionType::Call, call_oi)
                    .with_expiry(near)
                    .with_iv(18.0),
            );
            contracts.push(
                OptionContract::new(strike, OptionType::Put, put_oi)
                    .with_expiry(near)
                    .with_iv(18.0),
            );
        }
        contracts.push(OptionContract::new(600.0, OptionType::Call, 1).with_expiry(far));
        let chain = Chain::new("NIFTY", 505.0, contracts);

        let valuation = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let report = build_options_report(&chain, valuation, None, OPTIONS.risk_free_rate).unwrap();
        assert_eq!(report.expiry, Some(near));
        assert_eq!(report.available_expiries, vec![near, far]);
        assert_eq!(report.greeks.len(), 6);
        assert_eq!(report.max_pain, Some(500.0));
        assert_eq!(report.open_interest.total_call_oi, 7_100);

        let far_report =
            build_options_report(&chain, valuation, Some(far), OPTIONS.risk_free_rate).unwrap();
        assert_eq!(far_report.greeks.len(), 1);
        assert_eq!(far_report.max_pain, None);
    }
}
