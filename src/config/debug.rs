//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet.

pub struct DebugFlags {
    /// Emit the full per-regime score map after each classification.
    pub print_regime_scores: bool,
    /// Emit each breakout rule as it fires.
    pub print_breakout_rules: bool,
    /// Emit analysis cache hit/miss diagnostics.
    pub print_cache_events: bool,
    /// Emit per-symbol progress during batch scans.
    pub print_scan_progress: bool,
    /// If non-empty, emit detailed indicator output only for this symbol.
    /// Example: "RELIANCE.NS". Use "" to disable.
    pub print_indicators_for_symbol: &'static str,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_regime_scores: false,
    print_breakout_rules: false,
    print_cache_events: false,
    print_scan_progress: false,
    print_indicators_for_symbol: "",
};
