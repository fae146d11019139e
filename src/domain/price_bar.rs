use serde::{Deserialize, Serialize};

/// One OHLCV bar. `timestamp_ms` is the bar open time in epoch milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    // A constructor for convenience
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        PriceBar {
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// high >= max(open, close, low), low <= min(open, close, high), volume >= 0.
    /// NaN anywhere fails the check.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
            && self.volume >= 0.0
    }

    /// True range against the previous close. Without a previous bar it is just high - low.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(pc) if pc.is_finite() => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
            _ => hl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_bar() {
        let bar = PriceBar::new(0, 100.0, 105.0, 98.0, 103.0, 1_000.0);
        assert!(bar.is_well_formed());
    }

    #[test]
    fn test_malformed_bars() {
        // High below close
        assert!(!PriceBar::new(0, 100.0, 101.0, 99.0, 102.0, 1.0).is_well_formed());
        // Negative volume
        assert!(!PriceBar::new(0, 100.0, 101.0, 99.0, 100.0, -1.0).is_well_formed());
        // NaN close
        assert!(!PriceBar::new(0, 100.0, 101.0, 99.0, f64::NAN, 1.0).is_well_formed());
    }

    #[test]
    fn test_true_range_uses_gap_from_previous_close() {
        let bar = PriceBar::new(0, 110.0, 112.0, 109.0, 111.0, 1.0);
        assert!((bar.true_range(None) - 3.0).abs() < 1e-12);
        // Gap up from 100: |112 - 100| dominates
        assert!((bar.true_range(Some(100.0)) - 12.0).abs() < 1e-12);
    }
}
