use std::str::FromStr;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum OptionType {
    #[serde(rename = "CE", alias = "call", alias = "Call")]
    #[strum(to_string = "CE")]
    Call,
    #[serde(rename = "PE", alias = "put", alias = "Put")]
    #[strum(to_string = "PE")]
    Put,
}

impl FromStr for OptionType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" | "CALL" | "C" => Ok(OptionType::Call),
            "PE" | "PUT" | "P" => Ok(OptionType::Put),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unsupported option type '{}' (expected CE/PE or call/put)",
                other
            ))),
        }
    }
}

/// One row of an option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub strike: f64,
    pub option_type: OptionType,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub open_interest: u64,
    /// Annualised implied volatility in percent (e.g. 18.5 for 18.5%).
    #[serde(default)]
    pub implied_volatility: f64,
    #[serde(default)]
    pub last_price: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub ask: f64,
    #[serde(default)]
    pub volume: u64,
}

impl OptionContract {
    pub fn new(strike: f64, option_type: OptionType, open_interest: u64) -> Self {
        OptionContract {
            strike,
            option_type,
            expiry: None,
            open_interest,
            implied_volatility: 0.0,
            last_price: 0.0,
            bid: 0.0,
            ask: 0.0,
            volume: 0,
        }
    }

    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_iv(mut self, implied_volatility_pct: f64) -> Self {
        self.implied_volatility = implied_volatility_pct;
        self
    }
}

/// Option contracts sharing one underlying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub underlying: String,
    pub spot: f64,
    pub contracts: Vec<OptionContract>,
}

impl Chain {
    pub fn new(underlying: impl Into<String>, spot: f64, contracts: Vec<OptionContract>) -> Self {
        Chain {
            underlying: underlying.into(),
            spot,
            contracts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Distinct expiries, nearest first.
    pub fn expiries(&self) -> Vec<NaiveDate> {
        self.contracts
            .iter()
            .filter_map(|c| c.expiry)
            .sorted()
            .dedup()
            .collect()
    }

    pub fn nearest_expiry(&self) -> Option<NaiveDate> {
        self.contracts.iter().filter_map(|c| c.expiry).min()
    }

    /// A new chain holding only the contracts for `expiry`.
    pub fn for_expiry(&self, expiry: NaiveDate) -> Chain {
        Chain {
            underlying: self.underlying.clone(),
            spot: self.spot,
            contracts: self
                .contracts
                .iter()
                .filter(|c| c.expiry == Some(expiry))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("CE".parse::<OptionType>(), Ok(OptionType::Call));
        assert_eq!(" put ".parse::<OptionType>(), Ok(OptionType::Put));
        assert!(matches!(
            "XX".parse::<OptionType>(),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        assert_eq!(OptionType::Call.to_string(), "CE");
    }

    #[test]
    fn test_option_type_serde() {
        let c: OptionContract =
            serde_json::from_str(r#"{"strike": 500.0, "option_type": "PE", "open_interest": 10}"#)
                .unwrap();
        assert_eq!(c.option_type, OptionType::Put);
        assert_eq!(c.expiry, None);
        assert_eq!(serde_json::to_string(&OptionType::Call).unwrap(), "\"CE\"");
    }

    #[test]
    fn test_chain_expiries_and_filter() {
        let chain = Chain::new(
            "NIFTY",
            500.0,
            vec![
                OptionContract::new(500.0, OptionType::Call, 10).with_expiry(date(30)),
                OptionContract::new(500.0, OptionType::Put, 10).with_expiry(date(9)),
                OptionContract::new(520.0, OptionType::Call, 10).with_expiry(date(9)),
            ],
        );
        assert_eq!(chain.expiries(), vec![date(9), date(30)]);
        assert_eq!(chain.nearest_expiry(), Some(date(9)));
        let near = chain.for_expiry(date(9));
        assert_eq!(near.contracts.len(), 2);
        assert!(chain.for_expiry(date(1)).is_empty());
    }
}
