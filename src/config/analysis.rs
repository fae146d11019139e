//! Analysis and computation configuration

use crate::domain::Period;

/// Indicator engine windows
pub struct IndicatorConfig {
    // Below this many bars the whole snapshot is empty (hard floor, not per-field)
    pub min_bars_for_snapshot: usize,
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
    // RSI labels
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

/// Support/resistance, Fibonacci and volume profile settings
pub struct LevelsConfig {
    pub min_bars_for_pivots: usize,
    // Trailing windows for period highs/lows (~1 month, ~6 months, 52 weeks capped)
    pub one_month_bars: usize,
    pub six_month_bars: usize,
    pub fifty_two_week_bars: usize,
    pub fibonacci_lookback: Period,
    pub min_bars_for_fibonacci: usize,
    pub fibonacci_ratios: [f64; 7],
    pub poc_bins: usize,
    pub min_bars_for_poc: usize,
}

/// Market regime scoring thresholds
pub struct RegimeConfig {
    pub min_bars: usize,
    // Secondary timeframes (weekly/intraday) join the confluence vote above this size
    pub min_bars_secondary_timeframe: usize,
    pub atr_average_window: Period,
    pub range_window: usize,
    pub adx_trending: f64,
    pub adx_ranging: f64,
    pub rsi_bull: f64,
    pub rsi_bear: f64,
    pub rsi_neutral_band: (f64, f64),
    pub sma20_proximity_pct: f64,
    pub atr_expansion_mult: f64,
    pub tight_range_pct: f64,
}

/// Breakout scanner settings
pub struct BreakoutConfig {
    pub min_bars: usize,
    pub volume_avg_period: usize,
    // Results below this score are dropped (fixed policy)
    pub score_threshold: u32,
    pub volume_surge_ratio: f64,
    pub volume_elevated_ratio: f64,
    pub rsi_zone: (f64, f64),
    pub adx_trending: f64,
}

/// Auto-recommendation scoring and batch scan settings
pub struct SignalConfig {
    pub min_bars_for_scan: usize,
    // RSI outside the overbought/oversold bands still leans one point either way
    pub rsi_lean_bullish: f64,
    pub rsi_lean_bearish: f64,
    pub adx_trending: f64,
    pub buy_score: i32,
    pub sell_score: i32,
    pub confidence_base: i32,
    pub confidence_per_point: i32,
    pub confidence_floor: i32,
    pub confidence_ceiling: i32,
}

/// The Master Analysis Configuration
pub struct AnalysisConfig {
    pub indicators: IndicatorConfig,
    pub levels: LevelsConfig,
    pub regime: RegimeConfig,
    pub breakout: BreakoutConfig,
    pub signals: SignalConfig,
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    indicators: IndicatorConfig {
        min_bars_for_snapshot: 20,
        rsi_period: Period::of(14),
        adx_period: Period::of(14),
        atr_period: Period::of(14),
        sma_short: Period::of(20),
        sma_medium: Period::of(50),
        sma_long: Period::of(200),
        ema_period: Period::of(20),
        bollinger_period: Period::of(20),
        bollinger_std_mult: 2.0,
        macd_fast: Period::of(12),
        macd_slow: Period::of(26),
        macd_signal: Period::of(9),
        volume_avg_period: Period::of(20),
        rsi_overbought: 70.0,
        rsi_oversold: 30.0,
    },

    levels: LevelsConfig {
        min_bars_for_pivots: 5,
        one_month_bars: 22,
        six_month_bars: 130,
        fifty_two_week_bars: 200,
        // ~6 months of daily bars for significant swing points
        fibonacci_lookback: Period::of(120),
        min_bars_for_fibonacci: 5,
        fibonacci_ratios: [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0],
        poc_bins: 20,
        min_bars_for_poc: 10,
    },

    regime: RegimeConfig {
        min_bars: 200,
        min_bars_secondary_timeframe: 50,
        atr_average_window: Period::of(50),
        range_window: 20,
        adx_trending: 25.0,
        adx_ranging: 20.0,
        rsi_bull: 60.0,
        rsi_bear: 40.0,
        rsi_neutral_band: (45.0, 55.0),
        sma20_proximity_pct: 0.02,
        atr_expansion_mult: 1.5,
        tight_range_pct: 0.05,
    },

    breakout: BreakoutConfig {
        min_bars: 20,
        volume_avg_period: 20,
        score_threshold: 4,
        volume_surge_ratio: 2.0,
        volume_elevated_ratio: 1.5,
        rsi_zone: (50.0, 70.0),
        adx_trending: 25.0,
    },

    signals: SignalConfig {
        min_bars_for_scan: 30,
        rsi_lean_bullish: 45.0,
        rsi_lean_bearish: 60.0,
        adx_trending: 25.0,
        buy_score: 2,
        sell_score: -2,
        confidence_base: 50,
        confidence_per_point: 8,
        confidence_floor: 30,
        confidence_ceiling: 95,
    },
};
