//! Options analytics configuration

pub struct OptionsConfig {
    // India risk-free rate (RBI repo rate proxy), annualised
    pub risk_free_rate: f64,
    // Volatility floor used when a caller passes sigma <= 0
    pub min_volatility: f64,
    pub days_per_year: f64,
    pub min_strikes_for_max_pain: usize,
    // PCR above this reads as put hedging (bullish), below pcr_bearish as call resistance
    pub pcr_bullish: f64,
    pub pcr_bearish: f64,
}

pub const OPTIONS: OptionsConfig = OptionsConfig {
    risk_free_rate: 0.065,
    min_volatility: 1e-6,
    days_per_year: 365.0,
    min_strikes_for_max_pain: 2,
    pcr_bullish: 1.2,
    pcr_bearish: 0.7,
};
