//! Persisted market-state records.

use crate::book::{LimitOrder, Trade};
use crate::domain::{Instrument, Price};

/// The persisted image of a whole venue.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub venue_id: String,
    pub instruments: Vec<InstrumentState>,
}

/// Session price extremes of one instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentInfo {
    pub low_price: Option<Price>,
    pub high_price: Option<Price>,
}

/// The persisted order book of one instrument, sides in book order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBookState {
    pub buy_orders: Vec<LimitOrder>,
    pub sell_orders: Vec<LimitOrder>,
}

/// The persisted state of one instrument's engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentState {
    pub instrument: Instrument,
    pub last_trade: Option<Trade>,
    pub info: InstrumentInfo,
    pub order_book: OrderBookState,
}

impl InstrumentState {
    /// An empty state shell for the instrument, filled by its engine.
    #[must_use]
    pub fn empty(instrument: Instrument) -> Self {
        Self {
            instrument,
            last_trade: None,
            info: InstrumentInfo::default(),
            order_book: OrderBookState::default(),
        }
    }
}
