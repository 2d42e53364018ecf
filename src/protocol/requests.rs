//! Inbound request records.
//!
//! Protocol adapters decode wire messages into these records and submit
//! them through the middleware trading-request channel. Fields a client may
//! legally omit are optional here; the engine's validation chain is what
//! decides whether an omission is acceptable.

use crate::domain::{
    ClientOrderId, ExpireDate, ExpireTime, InstrumentDescriptor, MdRequestId,
    MdSubscriptionAction, MdUpdateMode, MdEntryType, OrderId, OrderType, Party, Price, Quantity,
    SecurityStatusReqId, Session, ShortSaleExemptionReason, Side, TimeInForce,
};

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacementRequest {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    pub order_price: Option<Price>,
    pub quantity: Option<Quantity>,
    pub time_in_force: Option<TimeInForce>,
    pub expire_time: Option<ExpireTime>,
    pub expire_date: Option<ExpireDate>,
    pub short_sale_exemption_reason: Option<ShortSaleExemptionReason>,
}

impl OrderPlacementRequest {
    /// An empty request shell for the given session and instrument.
    #[must_use]
    pub fn new(session: Session, instrument: InstrumentDescriptor) -> Self {
        Self {
            session,
            instrument,
            client_order_id: None,
            parties: Vec::new(),
            side: None,
            order_type: None,
            order_price: None,
            quantity: None,
            time_in_force: None,
            expire_time: None,
            expire_date: None,
            short_sale_exemption_reason: None,
        }
    }
}

/// Request to modify a resting order.
///
/// The target order is located by `venue_order_id` when present, otherwise
/// by `orig_client_order_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderModificationRequest {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub venue_order_id: Option<OrderId>,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    pub order_price: Option<Price>,
    pub quantity: Option<Quantity>,
    pub time_in_force: Option<TimeInForce>,
    pub expire_time: Option<ExpireTime>,
    pub expire_date: Option<ExpireDate>,
    pub short_sale_exemption_reason: Option<ShortSaleExemptionReason>,
}

impl OrderModificationRequest {
    #[must_use]
    pub fn new(session: Session, instrument: InstrumentDescriptor) -> Self {
        Self {
            session,
            instrument,
            venue_order_id: None,
            client_order_id: None,
            orig_client_order_id: None,
            parties: Vec::new(),
            side: None,
            order_type: None,
            order_price: None,
            quantity: None,
            time_in_force: None,
            expire_time: None,
            expire_date: None,
            short_sale_exemption_reason: None,
        }
    }
}

/// Request to cancel a resting order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancellationRequest {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub venue_order_id: Option<OrderId>,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub side: Option<Side>,
}

impl OrderCancellationRequest {
    #[must_use]
    pub fn new(session: Session, instrument: InstrumentDescriptor) -> Self {
        Self {
            session,
            instrument,
            venue_order_id: None,
            client_order_id: None,
            orig_client_order_id: None,
            side: None,
        }
    }
}

/// Market-data subscription, unsubscription or one-shot snapshot request.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataRequest {
    pub session: Session,
    pub request_id: Option<MdRequestId>,
    pub action: Option<MdSubscriptionAction>,
    pub update_mode: Option<MdUpdateMode>,
    pub entry_types: Vec<MdEntryType>,
    /// Requested book depth; `0` means the full book.
    pub depth: Option<u32>,
    /// The request must name exactly one instrument.
    pub instruments: Vec<InstrumentDescriptor>,
}

impl MarketDataRequest {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            request_id: None,
            action: None,
            update_mode: None,
            entry_types: Vec::new(),
            depth: None,
            instruments: Vec::new(),
        }
    }
}

/// Security-status subscription, unsubscription or snapshot request.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityStatusRequest {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub request_id: Option<SecurityStatusReqId>,
    pub action: Option<MdSubscriptionAction>,
    pub seq_num: Option<u64>,
}

impl SecurityStatusRequest {
    #[must_use]
    pub fn new(session: Session, instrument: InstrumentDescriptor) -> Self {
        Self { session, instrument, request_id: None, action: None, seq_num: None }
    }
}

/// Synchronous query for the current top-of-book state of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentStateRequest {
    pub instrument: InstrumentDescriptor,
}

/// Notification that a client session disconnected.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTerminatedEvent {
    pub session: Session,
}
