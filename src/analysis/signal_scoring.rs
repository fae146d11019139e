use serde::{Deserialize, Serialize};

use crate::analysis::indicators::{BandSignal, IndicatorSnapshot, MacdSignal, PriceVsAverage};
use crate::config::ANALYSIS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

/// Rule-based recommendation for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalScore {
    pub signal: TradeSignal,
    pub score: i32,
    pub confidence: u8,
}

/// Additive score over momentum, trend and band position.
///
/// Missing MACD or SMA20 readings count against the symbol, exactly like a bearish reading.
pub fn score_snapshot(snapshot: &IndicatorSnapshot) -> SignalScore {
    let cfg = &ANALYSIS.signals;
    let ind = &ANALYSIS.indicators;
    let mut score = 0;

    if let Some(rsi) = snapshot.rsi {
        if rsi < ind.rsi_oversold {
            score += 2;
        } else if rsi > ind.rsi_overbought {
            score -= 2;
        } else if rsi < cfg.rsi_lean_bullish {
            score += 1;
        } else if rsi > cfg.rsi_lean_bearish {
            score -= 1;
        }
    }

    score += match snapshot.macd_signal() {
        Some(MacdSignal::Bullish) => 2,
        _ => -1,
    };

    score += match snapshot.bollinger_signal() {
        Some(BandSignal::Oversold) => 2,
        Some(BandSignal::Overbought) => -2,
        _ => 0,
    };

    score += match snapshot.price_vs_sma20 {
        Some(PriceVsAverage::Above) => 1,
        _ => -1,
    };

    if snapshot.adx.is_some_and(|adx| adx > cfg.adx_trending) {
        score += 1;
    }

    let signal = if score >= cfg.buy_score {
        TradeSignal::Buy
    } else if score <= cfg.sell_score {
        TradeSignal::Sell
    } else {
        TradeSignal::Hold
    };

    let confidence = (cfg.confidence_base + score * cfg.confidence_per_point)
        .clamp(cfg.confidence_floor, cfg.confidence_ceiling);

    SignalScore {
        signal,
        score,
        confidence: confidence as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::indicators::{BollingerReading, MacdReading};

    fn macd(signal: MacdSignal) -> Option<MacdReading> {
        Some(MacdReading {
            line: 1.0,
            signal_line: 0.5,
            histogram: 0.5,
            signal,
        })
    }

    fn bands(signal: BandSignal) -> Option<BollingerReading> {
        Some(BollingerReading {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
            signal,
        })
    }

    #[test]
    fn test_oversold_bounce_is_buy() {
        let snapshot = IndicatorSnapshot {
            rsi: Some(25.0),
            macd: macd(MacdSignal::Bullish),
            bollinger: bands(BandSignal::Oversold),
            price_vs_sma20: Some(PriceVsAverage::Below),
            adx: Some(30.0),
            ..Default::default()
        };
        let result = score_snapshot(&snapshot);
        // 2 + 2 + 2 - 1 + 1
        assert_eq!(result.score, 6);
        assert_eq!(result.signal, TradeSignal::Buy);
        assert_eq!(result.confidence, 95);
    }

    #[test]
    fn test_overbought_is_sell() {
        let snapshot = IndicatorSnapshot {
            rsi: Some(75.0),
            macd: macd(MacdSignal::Bearish),
            bollinger: bands(BandSignal::Overbought),
            price_vs_sma20: Some(PriceVsAverage::Above),
            ..Default::default()
        };
        let result = score_snapshot(&snapshot);
        // -2 - 1 - 2 + 1
        assert_eq!(result.score, -4);
        assert_eq!(result.signal, TradeSignal::Sell);
        assert_eq!(result.confidence, 30);
        assert_eq!(result.signal.to_string(), "SELL");
    }

    #[test]
    fn test_missing_readings_lean_bearish() {
        let result = score_snapshot(&IndicatorSnapshot::default());
        // Missing MACD and SMA20 both count -1
        assert_eq!(result.score, -2);
        assert_eq!(result.signal, TradeSignal::Sell);

        let mild = IndicatorSnapshot {
            rsi: Some(50.0),
            macd: macd(MacdSignal::Bullish),
            price_vs_sma20: Some(PriceVsAverage::Below),
            ..Default::default()
        };
        let result = score_snapshot(&mild);
        assert_eq!(result.score, 1);
        assert_eq!(result.signal, TradeSignal::Hold);
        assert_eq!(result.confidence, 58);
    }
}
