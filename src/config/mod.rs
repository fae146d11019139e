//! Configuration module for the quant_lens engine.

pub mod analysis;

mod debug; // Private: use crate::config::DEBUG_FLAGS, not crate::config::debug::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

pub mod options;
pub mod persistence;

// Re-export commonly used items
pub use analysis::{
    ANALYSIS, AnalysisConfig, BreakoutConfig, IndicatorConfig, LevelsConfig, RegimeConfig,
    SignalConfig,
};
pub use options::OPTIONS;
pub use persistence::PERSISTENCE;
