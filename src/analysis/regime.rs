//! Market regime classifier.
//!
//! A stateless additive scoring pass over trend strength, direction, momentum, moving
//! average alignment, volatility and recent range. Every call re-evaluates from scratch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::analysis::indicators::{directional_index, rsi, sma};
use crate::config::{ANALYSIS, DEBUG_FLAGS};
use crate::domain::Series;
use crate::utils::maths_utils::{finite, get_max, get_min, rolling_mean, round2};

/// Regime labels. Declaration order is the tie-break priority: when two regimes share the
/// top score, the one declared first wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum Regime {
    #[serde(rename = "Strong Bull")]
    #[strum(to_string = "Strong Bull")]
    StrongBull,
    #[serde(rename = "Strong Bear")]
    #[strum(to_string = "Strong Bear")]
    StrongBear,
    #[serde(rename = "Weak Bull")]
    #[strum(to_string = "Weak Bull")]
    WeakBull,
    #[serde(rename = "Weak Bear")]
    #[strum(to_string = "Weak Bear")]
    WeakBear,
    Ranging,
    Volatile,
    Unknown,
}

impl Regime {
    pub fn description(&self) -> &'static str {
        match self {
            Regime::StrongBull => "Strong uptrend with high conviction. Consider buying on dips.",
            Regime::StrongBear => {
                "Strong downtrend with high conviction. Consider selling on rallies."
            }
            Regime::WeakBull => "Moderate uptrend, low conviction. Watch for confirmation.",
            Regime::WeakBear => "Moderate downtrend, low conviction. Watch for confirmation.",
            Regime::Ranging => "Sideways market with no clear direction. Trade range boundaries.",
            Regime::Volatile => {
                "High volatility environment. Use wider stops, reduce position size."
            }
            Regime::Unknown => "Insufficient data (need 200+ periods)",
        }
    }

    /// The six labels the scorer can actually pick.
    pub fn scored() -> impl Iterator<Item = Regime> {
        Regime::iter().filter(|r| *r != Regime::Unknown)
    }
}

/// Latest-bar readings the classifier looked at. Price distances are in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeMetrics {
    pub adx: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub price_vs_sma20: Option<f64>,
    pub price_vs_sma50: Option<f64>,
    pub price_vs_sma200: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regime: Regime,
    /// 0..=100
    pub confidence: u8,
    pub description: String,
    pub metrics: RegimeMetrics,
    pub regime_scores: BTreeMap<Regime, i32>,
}

impl RegimeResult {
    pub fn unknown() -> Self {
        RegimeResult {
            regime: Regime::Unknown,
            confidence: 0,
            description: Regime::Unknown.description().to_string(),
            metrics: RegimeMetrics::default(),
            regime_scores: BTreeMap::new(),
        }
    }
}

/// Raw inputs to the scoring rules. A rule whose inputs are missing does not fire.
#[derive(Debug, Clone, Copy, Default)]
struct RegimeInputs {
    price: Option<f64>,
    adx: Option<f64>,
    plus_di: Option<f64>,
    minus_di: Option<f64>,
    rsi: Option<f64>,
    sma20: Option<f64>,
    sma50: Option<f64>,
    sma200: Option<f64>,
    atr: Option<f64>,
    avg_atr: Option<f64>,
    range_pct: Option<f64>,
}

impl RegimeInputs {
    fn from_series(series: &Series) -> Self {
        let cfg = &ANALYSIS.regime;
        let ind = &ANALYSIS.indicators;
        let closes = &series.close_prices;

        let directional = directional_index(series, ind.adx_period);
        let avg_atr = rolling_mean(&directional.atr, cfg.atr_average_window);

        let (start, end) = series.get_indices_most_recent(cfg.range_window);
        let recent_high = get_max(&series.high_prices[start..end]);
        let recent_low = get_min(&series.low_prices[start..end]);
        let range_pct = match (recent_high, recent_low) {
            (Some(h), Some(l)) if l > 0.0 => finite((h - l) / l),
            _ => None,
        };

        RegimeInputs {
            price: series.last_close().and_then(finite),
            adx: last(&directional.adx),
            plus_di: last(&directional.plus_di),
            minus_di: last(&directional.minus_di),
            rsi: last(&rsi(closes, ind.rsi_period)),
            sma20: last(&sma(closes, ind.sma_short)),
            sma50: last(&sma(closes, ind.sma_medium)),
            sma200: last(&sma(closes, ind.sma_long)),
            atr: last(&directional.atr),
            avg_atr: last(&avg_atr),
            range_pct,
        }
    }

    fn score(&self) -> BTreeMap<Regime, i32> {
        let cfg = &ANALYSIS.regime;
        let mut scores: BTreeMap<Regime, i32> = Regime::scored().map(|r| (r, 0)).collect();
        let mut add = |regime: Regime, points: i32| {
            *scores.entry(regime).or_insert(0) += points;
        };

        // Trend strength
        match self.adx {
            Some(adx) if adx > cfg.adx_trending => {
                add(Regime::StrongBull, 2);
                add(Regime::StrongBear, 2);
            }
            Some(adx) if adx < cfg.adx_ranging => {
                add(Regime::Ranging, 3);
                add(Regime::WeakBull, 1);
                add(Regime::WeakBear, 1);
            }
            _ => {}
        }

        // Trend direction: anything short of a clear +DI lead counts as bearish
        match (self.plus_di, self.minus_di) {
            (Some(plus), Some(minus)) if plus > minus => {
                add(Regime::StrongBull, 3);
                add(Regime::WeakBull, 2);
            }
            _ => {
                add(Regime::StrongBear, 3);
                add(Regime::WeakBear, 2);
            }
        }

        // Momentum
        if let Some(rsi) = self.rsi {
            let (neutral_lo, neutral_hi) = cfg.rsi_neutral_band;
            if rsi > cfg.rsi_bull {
                add(Regime::StrongBull, 2);
                add(Regime::WeakBull, 1);
            } else if rsi < cfg.rsi_bear {
                add(Regime::StrongBear, 2);
                add(Regime::WeakBear, 1);
            } else if (neutral_lo..=neutral_hi).contains(&rsi) {
                add(Regime::Ranging, 2);
            }
        }

        // Moving average alignment
        if let (Some(price), Some(sma20)) = (self.price, self.sma20) {
            let stack = self.sma50.zip(self.sma200);
            match stack {
                Some((sma50, sma200)) if price > sma20 && sma20 > sma50 && sma50 > sma200 => {
                    add(Regime::StrongBull, 4)
                }
                Some((sma50, sma200)) if price < sma20 && sma20 < sma50 && sma50 < sma200 => {
                    add(Regime::StrongBear, 4)
                }
                _ => {
                    if sma20 > 0.0 && ((price - sma20).abs() / sma20) < cfg.sma20_proximity_pct {
                        add(Regime::Ranging, 2);
                    }
                }
            }
        }

        // Volatility expansion
        if let (Some(atr), Some(avg_atr)) = (self.atr, self.avg_atr) {
            if atr > cfg.atr_expansion_mult * avg_atr {
                add(Regime::Volatile, 5);
            }
        }

        // Tight recent range
        if let Some(range_pct) = self.range_pct {
            if range_pct < cfg.tight_range_pct {
                add(Regime::Ranging, 3);
            }
        }

        scores
    }

    fn metrics(&self) -> RegimeMetrics {
        let distance = |sma: Option<f64>| -> Option<f64> {
            let (price, sma) = (self.price?, sma?);
            if sma == 0.0 {
                return None;
            }
            finite((price - sma) / sma * 100.0).map(round2)
        };
        RegimeMetrics {
            adx: self.adx.map(round2),
            rsi: self.rsi.map(round2),
            atr: self.atr.map(round2),
            plus_di: self.plus_di.map(round2),
            minus_di: self.minus_di.map(round2),
            price_vs_sma20: distance(self.sma20),
            price_vs_sma50: distance(self.sma50),
            price_vs_sma200: distance(self.sma200),
        }
    }
}

fn last(values: &[Option<f64>]) -> Option<f64> {
    values.last().copied().flatten()
}

/// Highest score wins, first in priority order on a tie.
fn pick_regime(scores: &BTreeMap<Regime, i32>) -> (Regime, u8) {
    let mut best: Option<(Regime, i32)> = None;
    for (&regime, &score) in scores {
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((regime, score)),
        }
    }
    let Some((regime, best_score)) = best else {
        return (Regime::Unknown, 0);
    };

    let total: i32 = scores.values().sum();
    let confidence = (100.0 * best_score as f64 / total.max(1) as f64).round();
    (regime, confidence.clamp(0.0, 100.0) as u8)
}

/// Classify the latest bar of `series`. Below the bar floor the result is `Unknown` with
/// zero confidence.
pub fn detect_market_regime(series: &Series) -> RegimeResult {
    if !series.has_even_columns() {
        return RegimeResult::unknown();
    }
    if series.len() < ANALYSIS.regime.min_bars {
        log::debug!(
            "{}: {} bars, regime needs {}",
            series.symbol,
            series.len(),
            ANALYSIS.regime.min_bars
        );
        return RegimeResult::unknown();
    }

    let inputs = RegimeInputs::from_series(series);
    let scores = inputs.score();
    let (regime, confidence) = pick_regime(&scores);

    if DEBUG_FLAGS.print_regime_scores {
        log::info!(
            "{} regime scores: {:?} -> {} ({}%)",
            series.symbol,
            scores,
            regime,
            confidence
        );
    }

    RegimeResult {
        regime,
        confidence,
        description: regime.description().to_string(),
        metrics: inputs.metrics(),
        regime_scores: scores,
    }
}

// ============================================================================
// Multi-timeframe confluence
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Confluence {
    /// Every timeframe agrees.
    Strong,
    /// The daily regime holds a strict majority.
    Moderate,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframeRegime {
    pub daily: RegimeResult,
    pub weekly: Option<RegimeResult>,
    pub intraday: Option<RegimeResult>,
    pub confluence: Confluence,
    pub overall_regime: Regime,
}

/// Regime per timeframe plus how well they agree. Secondary timeframes are only classified
/// when they have enough bars; the daily series always is.
pub fn detect_multi_timeframe_regime(
    daily: &Series,
    weekly: Option<&Series>,
    intraday: Option<&Series>,
) -> MultiTimeframeRegime {
    let min_bars = ANALYSIS.regime.min_bars_secondary_timeframe;
    let classify = |s: Option<&Series>| {
        s.filter(|s| s.len() >= min_bars)
            .map(detect_market_regime)
    };

    let daily_result = detect_market_regime(daily);
    let weekly_result = classify(weekly);
    let intraday_result = classify(intraday);

    let regimes: Vec<Regime> = std::iter::once(&daily_result)
        .chain(weekly_result.iter())
        .chain(intraday_result.iter())
        .map(|r| r.regime)
        .collect();

    let primary = daily_result.regime;
    let agreeing = regimes.iter().filter(|&&r| r == primary).count();
    let confluence = if agreeing == regimes.len() {
        Confluence::Strong
    } else if 2 * agreeing > regimes.len() {
        Confluence::Moderate
    } else {
        Confluence::Mixed
    };

    MultiTimeframeRegime {
        daily: daily_result,
        weekly: weekly_result,
        intraday: intraday_result,
        confluence,
        overall_regime: primary,
    }
}
