use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// A validated look-back window length, in bars. Never zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "usize", into = "usize")]
pub struct Period(NonZeroUsize);

impl Period {
    pub fn new(bars: usize) -> Result<Self> {
        NonZeroUsize::new(bars)
            .map(Period)
            .ok_or_else(|| AnalyticsError::InvalidParameter("period must be at least 1 bar".into()))
    }

    /// For compile-time defaults. Panics during const evaluation if `bars` is zero.
    pub const fn of(bars: usize) -> Self {
        match NonZeroUsize::new(bars) {
            Some(n) => Period(n),
            None => panic!("period must be at least 1 bar"),
        }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for Period {
    type Error = AnalyticsError;

    fn try_from(bars: usize) -> Result<Self> {
        Period::new(bars)
    }
}

impl From<Period> for usize {
    fn from(p: Period) -> usize {
        p.get()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
