use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::breakout::{BreakoutResult, scan_breakout};
use crate::analysis::indicators::{MacdSignal, compute_snapshot};
use crate::analysis::levels::{SupportResistance, compute_support_resistance};
use crate::analysis::signal_scoring::{SignalScore, TradeSignal, score_snapshot};
use crate::config::{ANALYSIS, DEBUG_FLAGS};
use crate::domain::Series;
use crate::utils::maths_utils::{finite, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum MarketSentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl MarketSentiment {
    /// Bullish when buys outnumber sells more than two to one, and the reverse for bearish.
    pub fn from_counts(buys: usize, sells: usize) -> Self {
        if buys > sells * 2 {
            MarketSentiment::Bullish
        } else if sells > buys * 2 {
            MarketSentiment::Bearish
        } else {
            MarketSentiment::Neutral
        }
    }
}

/// Per-symbol outcome of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub symbol: String,
    pub price: f64,
    pub change_percent: Option<f64>,
    pub signal: SignalScore,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub macd_signal: Option<MacdSignal>,
    pub support_resistance: Option<SupportResistance>,
    pub breakout: Option<BreakoutResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub symbols_analyzed: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    pub market_sentiment: MarketSentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub summary: ScanSummary,
    /// Highest confidence first.
    pub buy: Vec<ScanEntry>,
    /// Highest confidence first.
    pub sell: Vec<ScanEntry>,
    pub hold: Vec<ScanEntry>,
}

/// Score one symbol. `None` when the series is too short to be worth scanning.
pub fn scan_symbol(series: &Series) -> Option<ScanEntry> {
    if !series.has_even_columns() {
        return None;
    }
    if series.len() < ANALYSIS.signals.min_bars_for_scan {
        if DEBUG_FLAGS.print_scan_progress {
            log::info!("Skipping {}: only {} bars", series.symbol, series.len());
        }
        return None;
    }

    let price = series.last_close().and_then(finite)?;
    let change_percent = series
        .prev_close()
        .filter(|prev| *prev != 0.0)
        .and_then(|prev| finite((price - prev) / prev * 100.0))
        .map(round2);

    let snapshot = compute_snapshot(series);
    let levels = compute_support_resistance(series);
    let breakout = scan_breakout(series, levels.as_ref(), &snapshot);
    let signal = score_snapshot(&snapshot);

    if DEBUG_FLAGS.print_scan_progress {
        log::info!(
            "{}: {} (score {}, confidence {})",
            series.symbol,
            signal.signal,
            signal.score,
            signal.confidence
        );
    }

    Some(ScanEntry {
        symbol: series.symbol.clone(),
        price: round2(price),
        change_percent,
        signal,
        rsi: snapshot.rsi,
        adx: snapshot.adx,
        macd_signal: snapshot.macd_signal(),
        support_resistance: levels,
        breakout,
    })
}

/// Batch scanner over many symbols. Every symbol is scored independently, in parallel.
pub struct MultiSymbolScanner {
    series: BTreeMap<String, Series>,
}

impl MultiSymbolScanner {
    pub fn new() -> Self {
        Self {
            series: BTreeMap::new(),
        }
    }

    /// Add (or replace) the series for its symbol
    pub fn add_series(&mut self, series: Series) {
        self.series.insert(series.symbol.clone(), series);
    }

    pub fn get_series(&self, symbol: &str) -> Option<&Series> {
        self.series.get(symbol)
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn scan(&self) -> ScanReport {
        let all: Vec<&Series> = self.series.values().collect();
        scan_all(&all)
    }
}

impl Default for MultiSymbolScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a batch and bucket the results by signal.
pub fn scan_all(series: &[&Series]) -> ScanReport {
    let entries: Vec<ScanEntry> = series.par_iter().filter_map(|s| scan_symbol(s)).collect();
    let symbols_analyzed = entries.len();

    let mut buy = Vec::new();
    let mut sell = Vec::new();
    let mut hold = Vec::new();
    for entry in entries {
        match entry.signal.signal {
            TradeSignal::Buy => buy.push(entry),
            TradeSignal::Sell => sell.push(entry),
            TradeSignal::Hold => hold.push(entry),
        }
    }
    buy.sort_by(|a, b| b.signal.confidence.cmp(&a.signal.confidence));
    sell.sort_by(|a, b| b.signal.confidence.cmp(&a.signal.confidence));

    let summary = ScanSummary {
        symbols_analyzed,
        buy_count: buy.len(),
        sell_count: sell.len(),
        hold_count: hold.len(),
        market_sentiment: MarketSentiment::from_counts(buy.len(), sell.len()),
    };
    log::info!(
        "Scanned {} of {} symbols: {} buy / {} sell / {} hold ({})",
        symbols_analyzed,
        series.len(),
        summary.buy_count,
        summary.sell_count,
        summary.hold_count,
        summary.market_sentiment
    );

    ScanReport {
        summary,
        buy,
        sell,
        hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;

    fn series(symbol: &str, n: usize, slope: f64) -> Series {
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| {
                let x = i as f64;
                let c = 300.0 + slope * x + 2.0 * (x * 0.6).sin();
                PriceBar::new(i as i64, c, c + 1.0, c - 1.0, c, 5_000.0)
            })
            .collect();
        Series::from_bars(symbol, &bars)
    }

    #[test]
    fn test_sentiment_thresholds() {
        assert_eq!(MarketSentiment::from_counts(5, 2), MarketSentiment::Bullish);
        assert_eq!(MarketSentiment::from_counts(4, 2), MarketSentiment::Neutral);
        assert_eq!(MarketSentiment::from_counts(1, 3), MarketSentiment::Bearish);
        assert_eq!(MarketSentiment::from_counts(0, 0), MarketSentiment::Neutral);
    }

    #[test]
    fn test_short_series_are_skipped() {
        let mut scanner = MultiSymbolScanner::new();
        scanner.add_series(series("AAA", 29, 0.5));
        scanner.add_series(series("BBB", 80, 0.5));
        assert_eq!(scanner.symbol_count(), 2);

        let report = scanner.scan();
        assert_eq!(report.summary.symbols_analyzed, 1);
        let total = report.buy.len() + report.sell.len() + report.hold.len();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_ragged_series_is_skipped_not_fatal() {
        let mut ragged = series("RAGGED", 80, 0.5);
        ragged.high_prices.truncate(79);
        assert!(scan_symbol(&ragged).is_none());

        let healthy = series("OK", 80, 0.5);
        let report = scan_all(&[&ragged, &healthy]);
        assert_eq!(report.summary.symbols_analyzed, 1);
    }

    #[test]
    fn test_buckets_match_signals() {
        let mut scanner = MultiSymbolScanner::default();
        for (i, slope) in [-1.5, -0.5, 0.0, 0.5, 1.5].iter().enumerate() {
            scanner.add_series(series(&format!("S{}", i), 120, *slope));
        }
        let report = scanner.scan();
        assert_eq!(report.summary.symbols_analyzed, 5);
        assert!(report.buy.iter().all(|e| e.signal.signal == TradeSignal::Buy));
        assert!(report.sell.iter().all(|e| e.signal.signal == TradeSignal::Sell));
        assert!(
            report
                .buy
                .windows(2)
                .all(|w| w[0].signal.confidence >= w[1].signal.confidence)
        );
        assert_eq!(
            report.summary.market_sentiment,
            MarketSentiment::from_counts(report.summary.buy_count, report.summary.sell_count)
        );
        let entry = scan_symbol(scanner.get_series("S4").unwrap()).unwrap();
        assert!(entry.support_resistance.is_some());
        assert!(entry.change_percent.is_some());
    }
}
