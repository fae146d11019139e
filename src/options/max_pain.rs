use itertools::Itertools;

use crate::config::OPTIONS;
use crate::domain::{OptionContract, OptionType};

/// Total payout option writers owe if the underlying settles at `settle`.
pub fn writer_loss_at(contracts: &[OptionContract], settle: f64) -> f64 {
    contracts
        .iter()
        .filter(|c| c.strike.is_finite())
        .map(|c| {
            let oi = c.open_interest as f64;
            match c.option_type {
                OptionType::Call => (settle - c.strike).max(0.0) * oi,
                OptionType::Put => (c.strike - settle).max(0.0) * oi,
            }
        })
        .sum()
}

/// Strike at which option writers pay out the least. Needs at least two distinct strikes;
/// ties go to the lowest strike.
pub fn calculate_max_pain(contracts: &[OptionContract]) -> Option<f64> {
    let strikes: Vec<f64> = contracts
        .iter()
        .map(|c| c.strike)
        .filter(|k| k.is_finite())
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect();
    if strikes.len() < OPTIONS.min_strikes_for_max_pain {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for &strike in &strikes {
        let loss = writer_loss_at(contracts, strike);
        match best {
            Some((_, lowest)) if lowest <= loss => {}
            _ => best = Some((strike, loss)),
        }
    }
    best.map(|(strike, _)| strike)
}
