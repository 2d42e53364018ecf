//! Immutable trade records produced by crossings.

use crate::domain::{MarketPhase, Price, Quantity, Side};
use chrono::{DateTime, Utc};

/// A single crossing between two orders.
///
/// `buyer` and `seller` are counterparty identifiers (the order's first
/// party id, or the session identity when no party is attached); `seller`
/// is absent for anonymous matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub price: Price,
    pub quantity: Quantity,
    pub aggressor_side: Side,
    pub time: DateTime<Utc>,
    pub phase: MarketPhase,
}
