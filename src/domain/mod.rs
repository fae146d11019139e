// Domain types and value objects
pub mod option_contract;
pub mod period;
pub mod price_bar;
pub mod series;

// Re-export commonly used types
pub use option_contract::{Chain, OptionContract, OptionType};
pub use period::Period;
pub use price_bar::PriceBar;
pub use series::Series;
