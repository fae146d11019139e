//! Black-Scholes pricing and first-order Greeks for European options.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::config::OPTIONS;
use crate::domain::{Chain, OptionType};
use crate::error::{AnalyticsError, Result};
use crate::utils::maths_utils::round_dp;
use crate::utils::time_utils::year_fraction;

/// Standard normal, or a `NumericDependency` error if it cannot be built.
fn std_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::NumericDependency(e.to_string()))
}

/// Inputs for one pricing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParams {
    pub spot: f64,
    pub strike: f64,
    /// Years until expiry. Zero or negative means expired.
    pub time_to_expiry: f64,
    /// Annualised, e.g. 0.065
    pub risk_free_rate: f64,
    /// Annualised, e.g. 0.20 for 20%
    pub volatility: f64,
    pub option_type: OptionType,
}

impl OptionParams {
    /// Parameters at the default risk-free rate.
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        volatility: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate: OPTIONS.risk_free_rate,
            volatility,
            option_type,
        }
    }

    pub fn with_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(AnalyticsError::InvalidParameter(format!(
                    "{} must be a positive number, got {}",
                    name, v
                )))
            }
        };
        positive("spot", self.spot)?;
        positive("strike", self.strike)?;
        for (name, v) in [
            ("time_to_expiry", self.time_to_expiry),
            ("risk_free_rate", self.risk_free_rate),
            ("volatility", self.volatility),
        ] {
            if v.is_nan() || v.is_infinite() {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "{} must be finite, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }

    fn intrinsic(&self) -> f64 {
        match self.option_type {
            OptionType::Call => (self.spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.spot).max(0.0),
        }
    }
}

/// Price and sensitivities. Theta is per calendar day, vega per 1 vol point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub price: f64,
}

/// Closed-form Black-Scholes.
///
/// Expired options return intrinsic value with a moneyness delta and flat second-order
/// terms. A non-positive volatility is floored at a tiny epsilon instead of failing.
pub fn black_scholes_greeks(params: &OptionParams) -> Result<Greeks> {
    params.validate()?;
    let normal = std_normal()?;

    let OptionParams {
        spot: s,
        strike: k,
        time_to_expiry: t,
        risk_free_rate: r,
        option_type,
        ..
    } = *params;

    if t <= 0.0 {
        let delta = match option_type {
            OptionType::Call if s > k => 1.0,
            OptionType::Put if s < k => -1.0,
            _ => 0.0,
        };
        return Ok(Greeks {
            delta,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            price: round_dp(params.intrinsic(), 2),
        });
    }

    let sigma = if params.volatility <= 0.0 {
        OPTIONS.min_volatility
    } else {
        params.volatility
    };

    let sqrt_t = t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;
    let discount = (-r * t).exp();
    let pdf_d1 = normal.pdf(d1);

    let (price, delta, carry) = match option_type {
        OptionType::Call => (
            s * normal.cdf(d1) - k * discount * normal.cdf(d2),
            normal.cdf(d1),
            -r * k * discount * normal.cdf(d2),
        ),
        OptionType::Put => (
            k * discount * normal.cdf(-d2) - s * normal.cdf(-d1),
            normal.cdf(d1) - 1.0,
            r * k * discount * normal.cdf(-d2),
        ),
    };

    let gamma = pdf_d1 / (s * sigma * sqrt_t);
    let vega = s * pdf_d1 * sqrt_t / 100.0;
    let theta = (-(s * pdf_d1 * sigma) / (2.0 * sqrt_t) + carry) / OPTIONS.days_per_year;

    Ok(Greeks {
        delta: round_dp(delta, 4),
        gamma: round_dp(gamma, 6),
        theta: round_dp(theta, 4),
        vega: round_dp(vega, 4),
        price: round_dp(price, 2),
    })
}

/// One row of a chain-wide Greeks table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractGreeks {
    pub strike: f64,
    pub option_type: OptionType,
    pub expiry: NaiveDate,
    pub time_to_expiry: f64,
    /// Percent, as quoted on the contract.
    pub implied_volatility: f64,
    pub greeks: Greeks,
}

/// Greeks for every contract in `chain` using its own IV and expiry, valued on `valuation`.
///
/// Contracts without an expiry or with an unusable strike are left out. An unusable chain
/// spot is a parameter error.
pub fn chain_greeks(
    chain: &Chain,
    valuation: NaiveDate,
    risk_free_rate: f64,
) -> Result<Vec<ContractGreeks>> {
    if !(chain.spot.is_finite() && chain.spot > 0.0) {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{}: chain spot must be a positive number, got {}",
            chain.underlying, chain.spot
        )));
    }

    let mut rows = Vec::with_capacity(chain.contracts.len());
    for contract in &chain.contracts {
        let Some(expiry) = contract.expiry else {
            log::debug!(
                "{}: {} {} has no expiry, skipped",
                chain.underlying,
                contract.strike,
                contract.option_type
            );
            continue;
        };
        if !(contract.strike.is_finite() && contract.strike > 0.0) {
            log::warn!("{}: skipping unusable strike {}", chain.underlying, contract.strike);
            continue;
        }

        let t = year_fraction(valuation, expiry, OPTIONS.days_per_year);
        let params = OptionParams::new(
            chain.spot,
            contract.strike,
            t,
            contract.implied_volatility / 100.0,
            contract.option_type,
        )
        .with_rate(risk_free_rate);

        rows.push(ContractGreeks {
            strike: contract.strike,
            option_type: contract.option_type,
            expiry,
            time_to_expiry: round_dp(t, 6),
            implied_volatility: contract.implied_volatility,
            greeks: black_scholes_greeks(&params)?,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionContract;

    fn price(s: f64, k: f64, t: f64, sigma: f64, ty: OptionType) -> Greeks {
        black_scholes_greeks(&OptionParams::new(s, k, t, sigma, ty)).unwrap()
    }

    #[test]
    fn test_atm_call_delta_near_half() {
        let g = price(100.0, 100.0, 0.25, 0.2, OptionType::Call);
        assert!(g.delta > 0.5 && g.delta < 0.65, "delta {}", g.delta);
        assert!(g.gamma > 0.0);
        assert!(g.vega > 0.0);
        assert!(g.theta < 0.0);
    }

    #[test]
    fn test_moneyness_extremes() {
        let itm = price(600.0, 400.0, 0.25, 0.2, OptionType::Call);
        assert!(itm.delta > 0.9);
        let otm = price(400.0, 600.0, 0.25, 0.2, OptionType::Call);
        assert!(otm.delta < 0.05);
        let put = price(400.0, 600.0, 0.25, 0.2, OptionType::Put);
        assert!(put.delta < -0.9);
    }

    #[test]
    fn test_expiry_returns_intrinsic() {
        let g = price(550.0, 500.0, 0.0, 0.2, OptionType::Call);
        assert_eq!(g.price, 50.0);
        assert_eq!(g.delta, 1.0);
        assert_eq!(g.theta, 0.0);
        assert_eq!(g.gamma, 0.0);

        let g = price(550.0, 500.0, -0.1, 0.2, OptionType::Put);
        assert_eq!(g.price, 0.0);
        assert_eq!(g.delta, 0.0);

        let g = price(450.0, 500.0, 0.0, 0.2, OptionType::Put);
        assert_eq!(g.price, 50.0);
        assert_eq!(g.delta, -1.0);
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, sigma) = (520.0, 500.0, 0.5, 0.25);
        let r = OPTIONS.risk_free_rate;
        let call = price(s, k, t, sigma, OptionType::Call);
        let put = price(s, k, t, sigma, OptionType::Put);
        let parity = s - k * (-r * t).exp();
        assert!((call.price - put.price - parity).abs() < 1.0);
    }

    #[test]
    fn test_put_theta_is_time_decay() {
        let put = price(100.0, 100.0, 0.25, 0.2, OptionType::Put);
        assert!(put.theta < 0.0);
        assert!(put.vega > 0.0);
    }

    #[test]
    fn test_zero_volatility_is_clamped() {
        let g = price(120.0, 100.0, 0.5, 0.0, OptionType::Call);
        assert!(g.price.is_finite());
        // Deterministic forward: S - K e^{-rT}
        let expected = 120.0 - 100.0 * (-OPTIONS.risk_free_rate * 0.5f64).exp();
        assert!((g.price - expected).abs() < 0.01);
        assert_eq!(g.delta, 1.0);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        for params in [
            OptionParams::new(0.0, 100.0, 0.5, 0.2, OptionType::Call),
            OptionParams::new(100.0, -5.0, 0.5, 0.2, OptionType::Call),
            OptionParams::new(f64::NAN, 100.0, 0.5, 0.2, OptionType::Put),
            OptionParams::new(100.0, 100.0, f64::NAN, 0.2, OptionType::Put),
        ] {
            assert!(matches!(
                black_scholes_greeks(&params),
                Err(AnalyticsError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_chain_table_uses_contract_iv_and_expiry() {
        let valuation = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let chain = Chain::new(
            "NIFTY",
            500.0,
            vec![
                OptionContract::new(500.0, OptionType::Call, 10)
                    .with_expiry(expiry)
                    .with_iv(20.0),
                OptionContract::new(500.0, OptionType::Put, 10)
                    .with_expiry(expiry)
                    .with_iv(20.0),
                OptionContract::new(520.0, OptionType::Call, 10),
            ],
        );
        let rows = chain_greeks(&chain, valuation, OPTIONS.risk_free_rate).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[0].time_to_expiry - 30.0 / 365.0).abs() < 1e-6);

        let direct = price(500.0, 500.0, 30.0 / 365.0, 0.2, OptionType::Call);
        assert_eq!(rows[0].greeks, direct);

        let bad = Chain::new("NIFTY", 0.0, chain.contracts.clone());
        assert!(chain_greeks(&bad, valuation, 0.065).is_err());
    }
}
