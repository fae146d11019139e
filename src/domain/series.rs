use serde::{Deserialize, Serialize};

use crate::domain::price_bar::PriceBar;
use crate::error::{AnalyticsError, Result};

// ============================================================================
// Series: chronological OHLCV data for one symbol (oldest bar first)
// ============================================================================

/// Column-oriented OHLCV series. Immutable input: nothing in the engine mutates it.
///
/// Every column holds one entry per bar. Deserializing a series with columns of different
/// lengths fails.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    pub symbol: String,
    pub timestamps_ms: Vec<i64>,

    // Prices
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,

    // Volumes
    pub volumes: Vec<f64>,
}

/// Series as read from disk, before the column lengths are checked.
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    timestamps_ms: Vec<i64>,
    open_prices: Vec<f64>,
    high_prices: Vec<f64>,
    low_prices: Vec<f64>,
    close_prices: Vec<f64>,
    volumes: Vec<f64>,
}

impl TryFrom<RawSeries> for Series {
    type Error = AnalyticsError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        let series = Series {
            symbol: raw.symbol,
            timestamps_ms: raw.timestamps_ms,
            open_prices: raw.open_prices,
            high_prices: raw.high_prices,
            low_prices: raw.low_prices,
            close_prices: raw.close_prices,
            volumes: raw.volumes,
        };
        series.check_columns()?;
        Ok(series)
    }
}

impl Series {
    pub fn from_bars(symbol: impl Into<String>, bars: &[PriceBar]) -> Self {
        Series {
            symbol: symbol.into(),
            timestamps_ms: bars.iter().map(|b| b.timestamp_ms).collect(),
            open_prices: bars.iter().map(|b| b.open).collect(),
            high_prices: bars.iter().map(|b| b.high).collect(),
            low_prices: bars.iter().map(|b| b.low).collect(),
            close_prices: bars.iter().map(|b| b.close).collect(),
            volumes: bars.iter().map(|b| b.volume).collect(),
        }
    }

    pub fn get_bar(&self, idx: usize) -> PriceBar {
        PriceBar::new(
            self.timestamps_ms[idx],
            self.open_prices[idx],
            self.high_prices[idx],
            self.low_prices[idx],
            self.close_prices[idx],
            self.volumes[idx],
        )
    }

    pub fn bars(&self) -> impl Iterator<Item = PriceBar> + '_ {
        (0..self.len()).map(|i| self.get_bar(i))
    }

    pub fn len(&self) -> usize {
        self.close_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close_prices.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close_prices.last().copied()
    }

    /// Close of the bar before the last one, if there is one.
    pub fn prev_close(&self) -> Option<f64> {
        self.close_prices.len().checked_sub(2).map(|i| self.close_prices[i])
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.last().copied()
    }

    /// `(start, end)` indices (end exclusive) of the most recent `count` bars.
    /// Asking for more bars than exist just returns the whole series.
    pub fn get_indices_most_recent(&self, count: usize) -> (usize, usize) {
        let total = self.len();
        (total.saturating_sub(count), total)
    }

    /// Every column must be as long as `close_prices`. A ragged series is a parameter error.
    pub fn check_columns(&self) -> Result<()> {
        let bars = self.close_prices.len();
        let columns = [
            ("timestamps_ms", self.timestamps_ms.len()),
            ("open_prices", self.open_prices.len()),
            ("high_prices", self.high_prices.len()),
            ("low_prices", self.low_prices.len()),
            ("volumes", self.volumes.len()),
        ];
        match columns.iter().find(|(_, len)| *len != bars) {
            Some((name, len)) => Err(AnalyticsError::InvalidParameter(format!(
                "{}: {} has {} entries but close_prices has {}",
                self.symbol, name, len, bars
            ))),
            None => Ok(()),
        }
    }

    /// [`Series::check_columns`] as a flag; a mismatch is logged.
    pub(crate) fn has_even_columns(&self) -> bool {
        match self.check_columns() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Number of bars breaking the OHLCV invariants. Each offender is logged.
    pub fn validate(&self) -> usize {
        let mut malformed = 0;
        for (i, bar) in self.bars().enumerate() {
            if !bar.is_well_formed() {
                log::warn!(
                    "{}: bar {} (ts {}) is malformed: o={} h={} l={} c={} v={}",
                    self.symbol,
                    i,
                    bar.timestamp_ms,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                );
                malformed += 1;
            }
        }
        malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 10.0))
            .collect()
    }

    #[test]
    fn test_round_trip_bars() {
        let input = bars(&[10.0, 11.0, 12.0]);
        let series = Series::from_bars("TEST", &input);
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars().collect::<Vec<_>>(), input);
        assert_eq!(series.last_close(), Some(12.0));
        assert_eq!(series.prev_close(), Some(11.0));
    }

    #[test]
    fn test_most_recent_indices_saturate() {
        let series = Series::from_bars("TEST", &bars(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(series.get_indices_most_recent(2), (3, 5));
        assert_eq!(series.get_indices_most_recent(50), (0, 5));
    }

    #[test]
    fn test_ragged_columns_are_rejected() {
        let mut series = Series::from_bars("RAGGED", &bars(&[10.0, 11.0, 12.0]));
        assert!(series.check_columns().is_ok());

        series.volumes.pop();
        assert!(matches!(
            series.check_columns(),
            Err(AnalyticsError::InvalidParameter(_))
        ));

        let json = serde_json::to_value(&series).unwrap();
        let err = serde_json::from_value::<Series>(json).unwrap_err();
        assert!(err.to_string().contains("volumes has 2 entries"));
    }

    #[test]
    fn test_even_columns_deserialize() {
        let series = Series::from_bars("EVEN", &bars(&[10.0, 11.0]));
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(serde_json::from_str::<Series>(&json).unwrap(), series);
    }

    #[test]
    fn test_validate_counts_malformed_bars() {
        let mut input = bars(&[10.0, 11.0, 12.0]);
        input[1].high = 5.0;
        let series = Series::from_bars("TEST", &input);
        assert_eq!(series.validate(), 1);
        assert!(Series::default().is_empty());
    }
}
