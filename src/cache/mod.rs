// Expiring cache kept outside the pure engine
pub mod ttl_cache;

pub use ttl_cache::{TtlCache, make_cache_key};
