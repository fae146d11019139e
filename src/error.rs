use thiserror::Error;

/// The unified error type for the `quant_lens` engine.
///
/// Only malformed parameters raise. Short or degenerate data never does: those cases come
/// back as absent (`None`) values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A caller passed a parameter the engine cannot work with (zero period, zero bins,
    /// unknown option type, non-positive spot...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A numerical building block (e.g. the standard normal distribution) could not be set up.
    #[error("Numeric dependency unavailable: {0}")]
    NumericDependency(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
