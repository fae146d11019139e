// Options analytics: pricing, max pain and open-interest sentiment
pub mod greeks;
pub mod max_pain;
pub mod open_interest;

pub use greeks::{ContractGreeks, Greeks, OptionParams, black_scholes_greeks, chain_greeks};
pub use max_pain::{calculate_max_pain, writer_loss_at};
pub use open_interest::{OiSummary, PcrSignal, analyse_oi};
