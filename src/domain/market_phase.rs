//! The market phase pair reported on security status and market data.

use crate::domain::enums::{TradingPhase, TradingStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading phase together with the trading status overlaying it.
///
/// The pair controls whether matching and resting are permitted and is
/// attached to every market-data publication and security-status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPhase {
    pub trading_phase: TradingPhase,
    pub trading_status: TradingStatus,
}

impl MarketPhase {
    #[must_use]
    pub const fn new(trading_phase: TradingPhase, trading_status: TradingStatus) -> Self {
        Self { trading_phase, trading_status }
    }

    /// The regular continuous-trading phase.
    #[must_use]
    pub const fn open() -> Self {
        Self::new(TradingPhase::Open, TradingStatus::Resume)
    }

    /// Whether incoming orders may execute against the book.
    #[must_use]
    pub const fn matching_allowed(self) -> bool {
        matches!(self.trading_status, TradingStatus::Resume) && self.accepts_orders()
    }

    /// Whether new limit orders may rest in the book.
    #[must_use]
    pub const fn resting_allowed(self) -> bool {
        matches!(self.trading_status, TradingStatus::Resume) && self.accepts_orders()
    }

    const fn accepts_orders(self) -> bool {
        matches!(
            self.trading_phase,
            TradingPhase::Open
                | TradingPhase::OpeningAuction
                | TradingPhase::IntradayAuction
                | TradingPhase::ClosingAuction
        )
    }
}

impl Default for MarketPhase {
    fn default() -> Self {
        Self::open()
    }
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trading_phase, self.trading_status)
    }
}
