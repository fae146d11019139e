use serde::{Deserialize, Serialize};

use crate::config::OPTIONS;
use crate::domain::{OptionContract, OptionType};
use crate::utils::maths_utils::round2;

/// Directional read of the put/call open-interest ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum PcrSignal {
    /// Heavy put writing/hedging underneath the market.
    #[strum(to_string = "Bullish (high put OI - hedging)")]
    BullishHedging,
    /// Heavy call open interest capping the market.
    #[strum(to_string = "Bearish (high call OI - resistance)")]
    BearishResistance,
    Neutral,
}

impl PcrSignal {
    pub fn from_pcr(pcr: f64) -> Self {
        if pcr > OPTIONS.pcr_bullish {
            PcrSignal::BullishHedging
        } else if pcr < OPTIONS.pcr_bearish {
            PcrSignal::BearishResistance
        } else {
            PcrSignal::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OiSummary {
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    /// put OI / call OI, 0 when there is no call OI.
    pub pcr: f64,
    pub pcr_signal: PcrSignal,
    pub total_call_volume: u64,
    pub total_put_volume: u64,
    /// put volume / call volume, 0 when there is no call volume.
    pub volume_pcr: f64,
}

fn ratio(puts: u64, calls: u64) -> f64 {
    if calls == 0 {
        0.0
    } else {
        round2(puts as f64 / calls as f64)
    }
}

pub fn analyse_oi(contracts: &[OptionContract]) -> OiSummary {
    let (mut call_oi, mut put_oi) = (0u64, 0u64);
    let (mut call_volume, mut put_volume) = (0u64, 0u64);
    for c in contracts {
        match c.option_type {
            OptionType::Call => {
                call_oi += c.open_interest;
                call_volume += c.volume;
            }
            OptionType::Put => {
                put_oi += c.open_interest;
                put_volume += c.volume;
            }
        }
    }

    let pcr = ratio(put_oi, call_oi);
    OiSummary {
        total_call_oi: call_oi,
        total_put_oi: put_oi,
        pcr,
        pcr_signal: PcrSignal::from_pcr(pcr),
        total_call_volume: call_volume,
        total_put_volume: put_volume,
        volume_pcr: ratio(put_volume, call_volume),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcr_labels() {
        let chain = vec![
            OptionContract::new(500.0, OptionType::Call, 1_000),
            OptionContract::new(500.0, OptionType::Put, 1_500),
        ];
        let summary = analyse_oi(&chain);
        assert_eq!(summary.total_put_oi, 1_500);
        assert_eq!(summary.pcr, 1.5);
        assert_eq!(summary.pcr_signal, PcrSignal::BullishHedging);

        let calls_heavy = vec![
            OptionContract::new(500.0, OptionType::Call, 3_000),
            OptionContract::new(500.0, OptionType::Put, 1_000),
        ];
        assert_eq!(analyse_oi(&calls_heavy).pcr, 0.33);
        assert_eq!(
            analyse_oi(&calls_heavy).pcr_signal,
            PcrSignal::BearishResistance
        );
    }

    #[test]
    fn test_no_call_oi_gives_zero_ratio() {
        let puts_only = vec![OptionContract::new(500.0, OptionType::Put, 100)];
        let summary = analyse_oi(&puts_only);
        assert_eq!(summary.pcr, 0.0);
        // A zero ratio sits below the bearish band
        assert_eq!(summary.pcr_signal, PcrSignal::BearishResistance);
        assert_eq!(analyse_oi(&[]).pcr_signal, PcrSignal::BearishResistance);
    }

    #[test]
    fn test_neutral_band_and_display() {
        assert_eq!(PcrSignal::from_pcr(1.0), PcrSignal::Neutral);
        assert_eq!(PcrSignal::from_pcr(1.2), PcrSignal::Neutral);
        assert_eq!(PcrSignal::from_pcr(0.7), PcrSignal::Neutral);
        assert_eq!(
            PcrSignal::BullishHedging.to_string(),
            "Bullish (high put OI - hedging)"
        );
    }
}
