//! Outbound reply and notification records.
//!
//! Every record carries the session it must be routed to; the egress
//! adapter maps these onto wire messages. `VenueOrderId` on the wire is the
//! decimal rendering of [`OrderId`]; execution identifiers follow the
//! `<venue-order-id>-<sequence>` scheme.

use crate::domain::{
    BusinessRejectReason, ClientOrderId, ExecutionId, ExpireDate, ExpireTime,
    InstrumentDescriptor, MarketPhase, MdEntryAction, MdEntryType, MdRejectReason, MdRequestId,
    OrderId, OrderStatus, Party, Price, Quantity, RejectText, RejectedMessageType,
    SecurityStatusReqId, Session, Side, TimeInForce, TradingPhase, TradingStatus,
};
use chrono::{DateTime, Utc};

/// Acknowledgement of an accepted order placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacementConfirmation {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub side: Side,
    pub order_price: Option<Price>,
    pub order_quantity: Quantity,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<ExpireTime>,
    pub expire_date: Option<ExpireDate>,
}

/// Rejection of an order placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacementReject {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub reject_text: RejectText,
    pub side: Option<Side>,
    pub order_price: Option<Price>,
    pub order_quantity: Option<Quantity>,
    pub time_in_force: Option<TimeInForce>,
}

/// Acknowledgement of an accepted order modification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderModificationConfirmation {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub side: Side,
    pub order_price: Price,
    pub order_quantity: Quantity,
    pub cum_executed_quantity: Quantity,
    pub leaves_quantity: Quantity,
    pub order_status: OrderStatus,
    pub time_in_force: TimeInForce,
}

/// Rejection of an order modification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderModificationReject {
    pub session: Session,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub venue_order_id: Option<OrderId>,
    pub reject_text: RejectText,
    pub order_status: Option<OrderStatus>,
}

/// Acknowledgement of an accepted order cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancellationConfirmation {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub side: Side,
    pub order_price: Option<Price>,
    pub leaves_quantity: Quantity,
    pub cum_executed_quantity: Quantity,
    pub order_status: OrderStatus,
}

/// Rejection of an order cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancellationReject {
    pub session: Session,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub venue_order_id: Option<OrderId>,
    pub reject_text: RejectText,
    pub order_status: Option<OrderStatus>,
}

/// Report of an execution or of a terminal order event (fill, cancel,
/// expiry).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub client_order_id: Option<ClientOrderId>,
    pub parties: Vec<Party>,
    pub venue_order_id: OrderId,
    pub execution_id: ExecutionId,
    pub order_status: OrderStatus,
    pub executed_price: Option<Price>,
    pub executed_quantity: Option<Quantity>,
    pub cum_executed_quantity: Quantity,
    pub leaves_quantity: Quantity,
    pub side: Side,
    pub time_in_force: Option<TimeInForce>,
    pub reject_text: Option<RejectText>,
}

/// One market-data entry inside a snapshot or incremental update.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataEntry {
    pub entry_type: MdEntryType,
    /// Present on incremental updates only.
    pub action: Option<MdEntryAction>,
    pub price: Option<Price>,
    pub quantity: Option<Quantity>,
    pub aggressor_side: Option<Side>,
    pub time: Option<DateTime<Utc>>,
    pub phase: Option<MarketPhase>,
}

/// Initial (or one-shot) market-data snapshot for a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataSnapshot {
    pub session: Session,
    pub request_id: Option<MdRequestId>,
    pub instrument: InstrumentDescriptor,
    pub entries: Vec<MarketDataEntry>,
}

/// Incremental market-data update for a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataUpdate {
    pub session: Session,
    pub request_id: Option<MdRequestId>,
    pub entries: Vec<MarketDataEntry>,
}

/// Rejection of a market-data request.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataReject {
    pub session: Session,
    pub request_id: Option<MdRequestId>,
    pub reject_reason: Option<MdRejectReason>,
    pub reject_text: Option<RejectText>,
}

/// Security status report published on request and on phase transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityStatus {
    pub session: Session,
    pub instrument: InstrumentDescriptor,
    pub request_id: SecurityStatusReqId,
    pub trading_phase: TradingPhase,
    pub trading_status: TradingStatus,
}

/// Reject for structural problems outside the order-level reject flows.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessMessageReject {
    pub session: Session,
    pub business_reject_reason: BusinessRejectReason,
    pub text: RejectText,
    pub ref_message_type: RejectedMessageType,
    pub ref_seq_num: Option<u64>,
    pub ref_id: Option<String>,
}

/// Reply to an [`crate::protocol::InstrumentStateRequest`], filled in place
/// by the owning engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentState {
    pub best_bid_price: Option<Price>,
    pub current_bid_depth: Option<Quantity>,
    pub best_offer_price: Option<Price>,
    pub current_offer_depth: Option<Quantity>,
}

/// The union of all reply records a client can receive.
///
/// This is the payload of the trading-reply channel; the egress adapter
/// matches on the variant to build the wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientNotification {
    PlacementConfirmation(OrderPlacementConfirmation),
    PlacementReject(OrderPlacementReject),
    ModificationConfirmation(OrderModificationConfirmation),
    ModificationReject(OrderModificationReject),
    CancellationConfirmation(OrderCancellationConfirmation),
    CancellationReject(OrderCancellationReject),
    Execution(ExecutionReport),
    MarketDataSnapshot(MarketDataSnapshot),
    MarketDataUpdate(MarketDataUpdate),
    MarketDataReject(MarketDataReject),
    SecurityStatus(SecurityStatus),
    BusinessReject(BusinessMessageReject),
}

impl ClientNotification {
    /// The session this notification is routed to.
    #[must_use]
    pub fn session(&self) -> &Session {
        match self {
            ClientNotification::PlacementConfirmation(reply) => &reply.session,
            ClientNotification::PlacementReject(reply) => &reply.session,
            ClientNotification::ModificationConfirmation(reply) => &reply.session,
            ClientNotification::ModificationReject(reply) => &reply.session,
            ClientNotification::CancellationConfirmation(reply) => &reply.session,
            ClientNotification::CancellationReject(reply) => &reply.session,
            ClientNotification::Execution(reply) => &reply.session,
            ClientNotification::MarketDataSnapshot(reply) => &reply.session,
            ClientNotification::MarketDataUpdate(reply) => &reply.session,
            ClientNotification::MarketDataReject(reply) => &reply.session,
            ClientNotification::SecurityStatus(reply) => &reply.session,
            ClientNotification::BusinessReject(reply) => &reply.session,
        }
    }
}
