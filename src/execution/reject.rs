//! Routing-level reject composition.
//!
//! Requests that never reach an engine (unresolvable instrument, empty
//! descriptor, overloaded queue) still get exactly one terminal reply. A
//! per-process monotonic generator hands out plausible 18-digit venue order
//! ids so that even a rejected placement carries a well-formed
//! `VenueOrderId` and `ExecutionId`.

use crate::catalogue::ResolutionError;
use crate::domain::{
    BusinessRejectReason, ExecutionId, MdRejectReason, OrderId, RejectText, RejectedMessageType,
};
use crate::middleware::send_client_notification;
use crate::protocol::{
    BusinessMessageReject, ClientNotification, MarketDataReject, MarketDataRequest,
    OrderCancellationReject, OrderCancellationRequest, OrderModificationReject,
    OrderModificationRequest, OrderPlacementReject, OrderPlacementRequest, SecurityStatusRequest,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

/// First value of the reject order-id range; everything above stays at 18
/// decimal digits for the remainder of the process lifetime.
const REJECT_ORDER_ID_BASE: u64 = 100_000_000_000_000_000;

static NEXT_REJECT_ORDER_ID: AtomicU64 = AtomicU64::new(REJECT_ORDER_ID_BASE);

/// Allocates the next synthetic venue order id for a rejected request.
#[must_use]
pub fn next_reject_order_id() -> OrderId {
    OrderId::new(NEXT_REJECT_ORDER_ID.fetch_add(1, Ordering::Relaxed))
}

pub(crate) const REJECT_QUEUE_OVERLOAD: &str =
    "the trading system is overloaded, the request was not accepted";

fn resolution_text(error: ResolutionError) -> &'static str {
    match error {
        ResolutionError::NotFound => "instrument is not found",
        ResolutionError::Ambiguous => "instrument descriptor is ambiguous",
        ResolutionError::Empty => "instrument descriptor contains no usable identifier",
    }
}

/// Composes routing rejects and pushes them onto the trading-reply channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectNotifier;

impl RejectNotifier {
    pub fn reject_placement(&self, request: &OrderPlacementRequest, error: ResolutionError) {
        match error {
            ResolutionError::Empty => self.business_reject(
                request.session.clone(),
                RejectedMessageType::OrderPlacement,
                resolution_text(error),
            ),
            _ => {
                let venue_order_id = next_reject_order_id();
                self.publish(ClientNotification::PlacementReject(OrderPlacementReject {
                    session: request.session.clone(),
                    instrument: request.instrument.clone(),
                    client_order_id: request.client_order_id.clone(),
                    venue_order_id,
                    execution_id: ExecutionId::new(venue_order_id, 1),
                    reject_text: RejectText::from(resolution_text(error)),
                    side: request.side,
                    order_price: request.order_price,
                    order_quantity: request.quantity,
                    time_in_force: request.time_in_force,
                }));
            }
        }
    }

    pub fn reject_modification(&self, request: &OrderModificationRequest, error: ResolutionError) {
        match error {
            ResolutionError::Empty => self.business_reject(
                request.session.clone(),
                RejectedMessageType::OrderModification,
                resolution_text(error),
            ),
            _ => self.publish(ClientNotification::ModificationReject(OrderModificationReject {
                session: request.session.clone(),
                client_order_id: request.client_order_id.clone(),
                orig_client_order_id: request.orig_client_order_id.clone(),
                venue_order_id: request.venue_order_id,
                reject_text: RejectText::from(resolution_text(error)),
                order_status: None,
            })),
        }
    }

    pub fn reject_cancellation(&self, request: &OrderCancellationRequest, error: ResolutionError) {
        match error {
            ResolutionError::Empty => self.business_reject(
                request.session.clone(),
                RejectedMessageType::OrderCancellation,
                resolution_text(error),
            ),
            _ => self.publish(ClientNotification::CancellationReject(OrderCancellationReject {
                session: request.session.clone(),
                client_order_id: request.client_order_id.clone(),
                orig_client_order_id: request.orig_client_order_id.clone(),
                venue_order_id: request.venue_order_id,
                reject_text: RejectText::from(resolution_text(error)),
                order_status: None,
            })),
        }
    }

    /// Market-data routing rejects carry their own reason codes, with
    /// distinct texts for the no-instruments and multiple-instruments
    /// shapes of an empty resolution.
    pub fn reject_market_data(&self, request: &MarketDataRequest, text: &str, unknown_symbol: bool) {
        self.publish(ClientNotification::MarketDataReject(MarketDataReject {
            session: request.session.clone(),
            request_id: request.request_id.clone(),
            reject_reason: unknown_symbol.then_some(MdRejectReason::UnknownSymbol),
            reject_text: Some(RejectText::from(text)),
        }));
    }

    pub fn reject_security_status(&self, request: &SecurityStatusRequest, error: ResolutionError) {
        let reason = match error {
            ResolutionError::NotFound => BusinessRejectReason::UnknownSecurity,
            _ => BusinessRejectReason::Other,
        };
        self.publish(ClientNotification::BusinessReject(BusinessMessageReject {
            session: request.session.clone(),
            business_reject_reason: reason,
            text: RejectText::from(resolution_text(error)),
            ref_message_type: RejectedMessageType::SecurityStatusRequest,
            ref_seq_num: request.seq_num,
            ref_id: request.request_id.as_ref().map(|id| id.value().to_string()),
        }));
    }

    /// Generic business reject for structural problems.
    pub fn business_reject(
        &self,
        session: crate::domain::Session,
        ref_message_type: RejectedMessageType,
        text: &str,
    ) {
        self.publish(ClientNotification::BusinessReject(BusinessMessageReject {
            session,
            business_reject_reason: BusinessRejectReason::Other,
            text: RejectText::from(text),
            ref_message_type,
            ref_seq_num: None,
            ref_id: None,
        }));
    }

    fn publish(&self, notification: ClientNotification) {
        warn!(session = %notification.session(), "rejecting unroutable request");
        if let Err(cause) = send_client_notification(notification) {
            error!(%cause, "dropping routing reject");
        }
    }
}
