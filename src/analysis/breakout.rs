//! Breakout scanner: scores the latest bar against pivot levels, volume and momentum.

use serde::{Deserialize, Serialize};

use crate::analysis::indicators::{IndicatorSnapshot, MacdSignal, compute_snapshot};
use crate::analysis::levels::{SupportResistance, compute_support_resistance};
use crate::config::{ANALYSIS, DEBUG_FLAGS};
use crate::domain::Series;
use crate::utils::maths_utils::{finite, round2, tail_mean};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BreakoutType {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutResult {
    pub breakout_type: BreakoutType,
    pub score: u32,
    /// Human-readable reasons, in the order the rules fired.
    pub signals: Vec<String>,
    pub current_price: f64,
    pub volume_ratio: f64,
    pub rsi: Option<f64>,
    pub macd_signal: Option<MacdSignal>,
    pub adx: Option<f64>,
}

struct ScoreCard {
    score: u32,
    signals: Vec<String>,
}

impl ScoreCard {
    fn hit(&mut self, points: u32, signal: String) {
        if DEBUG_FLAGS.print_breakout_rules {
            log::info!("breakout rule: +{} {}", points, signal);
        }
        self.score += points;
        self.signals.push(signal);
    }
}

/// Today's volume over the trailing average (today included). 1.0 when there is no usable
/// average.
fn volume_ratio(series: &Series) -> f64 {
    let today = series.volumes.last().copied().and_then(finite);
    let average = tail_mean(&series.volumes, ANALYSIS.breakout.volume_avg_period);
    match (today, average) {
        (Some(today), Some(avg)) if avg > 0.0 => finite(today / avg).map(round2).unwrap_or(1.0),
        _ => 1.0,
    }
}

/// Score the latest bar. Returns `None` below the bar floor or when the score misses the
/// reporting threshold.
pub fn scan_breakout(
    series: &Series,
    levels: Option<&SupportResistance>,
    snapshot: &IndicatorSnapshot,
) -> Option<BreakoutResult> {
    let cfg = &ANALYSIS.breakout;
    if series.len() < cfg.min_bars || !series.has_even_columns() {
        return None;
    }

    let current_price = series.last_close().and_then(finite)?;
    let prev_price = series.prev_close().and_then(finite).unwrap_or(current_price);
    let ratio = volume_ratio(series);

    let mut card = ScoreCard {
        score: 0,
        signals: Vec::new(),
    };
    let mut breakout_type = BreakoutType::Neutral;

    if let Some(r1) = levels.map(|l| l.resistance.r1) {
        if prev_price < r1 && r1 <= current_price {
            card.hit(3, "Crossed above R1".to_string());
            breakout_type = BreakoutType::Bullish;
        } else if current_price > r1 {
            card.hit(1, format!("Holding above R1 ({:.2})", r1));
            breakout_type = BreakoutType::Bullish;
        }
    }

    if ratio >= cfg.volume_surge_ratio {
        card.hit(3, format!("Volume surge ({:.2}x average)", ratio));
    } else if ratio >= cfg.volume_elevated_ratio {
        card.hit(2, format!("Elevated volume ({:.2}x average)", ratio));
    }

    if let Some(rsi) = snapshot.rsi {
        let (lo, hi) = cfg.rsi_zone;
        if (lo..=hi).contains(&rsi) {
            card.hit(2, format!("RSI in momentum zone ({:.2})", rsi));
        }
    }

    if snapshot.macd_signal() == Some(MacdSignal::Bullish) {
        card.hit(1, "MACD bullish".to_string());
    }

    if let Some(adx) = snapshot.adx {
        if adx > cfg.adx_trending {
            card.hit(1, format!("Trending (ADX {:.2})", adx));
        }
    }

    // Bearish check runs last so it overrides a bullish label
    if let Some(s1) = levels.map(|l| l.support.s1) {
        if prev_price > s1 && s1 >= current_price {
            card.hit(3, "Crossed below S1".to_string());
            breakout_type = BreakoutType::Bearish;
        } else if current_price < s1 {
            card.signals.push(format!("Holding below S1 ({:.2})", s1));
            breakout_type = BreakoutType::Bearish;
        }
    }

    if card.score < cfg.score_threshold {
        log::debug!(
            "{}: breakout score {} below threshold {}",
            series.symbol,
            card.score,
            cfg.score_threshold
        );
        return None;
    }

    Some(BreakoutResult {
        breakout_type,
        score: card.score,
        signals: card.signals,
        current_price: round2(current_price),
        volume_ratio: ratio,
        rsi: snapshot.rsi,
        macd_signal: snapshot.macd_signal(),
        adx: snapshot.adx,
    })
}

/// Convenience wrapper that derives levels and indicators from `series` itself.
pub fn detect_breakout(series: &Series) -> Option<BreakoutResult> {
    let levels = compute_support_resistance(series);
    let snapshot = compute_snapshot(series);
    scan_breakout(series, levels.as_ref(), &snapshot)
}
