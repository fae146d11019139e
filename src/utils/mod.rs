// Shared helpers: maths, time and clocks
pub mod clock;
pub mod maths_utils;
pub mod time_utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use time_utils::TimeUtils;
