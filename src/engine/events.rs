//! Events delivered to every engine through its command queue.

use crate::domain::MarketPhase;
use chrono::{DateTime, NaiveDate, Utc};

/// Periodic timer event; carries the clock reading the engines act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub now: DateTime<Utc>,
    /// Local calendar day of `now`, used for day-order expiry.
    pub local_day: NaiveDate,
}

impl Tick {
    /// A tick for the given instant, deriving the local day from it.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, local_day: crate::utils::local_day_of(now) }
    }
}

/// Administrative or scheduled change of the market phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub phase: MarketPhase,
}
