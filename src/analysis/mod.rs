// Pure analytics over a Series: no I/O, no shared state
pub mod breakout;
pub mod indicators;
pub mod levels;
pub mod multi_symbol_scan;
pub mod regime;
pub mod signal_scoring;

// Re-export key types for convenience
pub use breakout::{BreakoutResult, BreakoutType, detect_breakout, scan_breakout};
pub use indicators::{IndicatorParams, IndicatorSnapshot, compute_snapshot, compute_snapshot_with};
pub use levels::{
    FibonacciLevels, LevelParams, SupportResistance, compute_fibonacci,
    compute_support_resistance, compute_volume_poc,
};
pub use multi_symbol_scan::{MarketSentiment, MultiSymbolScanner, ScanEntry, ScanReport, scan_all};
pub use regime::{
    Confluence, MultiTimeframeRegime, Regime, RegimeResult, detect_market_regime,
    detect_multi_timeframe_regime,
};
pub use signal_scoring::{SignalScore, TradeSignal, score_snapshot};
