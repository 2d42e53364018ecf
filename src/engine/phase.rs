//! Security-status subscriptions and trading-phase reporting.

use crate::domain::{
    BusinessRejectReason, InstrumentDescriptor, MarketPhase, MdSubscriptionAction, RejectText,
    RejectedMessageType, SecurityStatusReqId, Session,
};
use crate::protocol::{BusinessMessageReject, ClientNotification, SecurityStatus, SecurityStatusRequest};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct Subscription {
    session: Session,
    instrument: InstrumentDescriptor,
    request_id: SecurityStatusReqId,
}

/// Tracks security-status subscribers and publishes the market phase to
/// them on request and on every actual phase change.
#[derive(Debug, Default)]
pub struct SecurityStatusTracker {
    subscriptions: HashMap<(Session, SecurityStatusReqId), Subscription>,
}

impl SecurityStatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handles a security-status request addressed to this engine.
    pub fn process(
        &mut self,
        request: &SecurityStatusRequest,
        phase: MarketPhase,
        out: &mut Vec<ClientNotification>,
    ) {
        let Some(action) = request.action else {
            out.push(reject(
                request,
                BusinessRejectReason::Other,
                "security status subscription request type is missing",
            ));
            return;
        };
        let Some(request_id) = request.request_id.clone() else {
            out.push(reject(
                request,
                BusinessRejectReason::Other,
                "security status subscription request id is missing",
            ));
            return;
        };

        let key = (request.session.clone(), request_id.clone());
        match action {
            MdSubscriptionAction::Subscribe => {
                if self.subscriptions.contains_key(&key) {
                    out.push(reject(
                        request,
                        BusinessRejectReason::Other,
                        "security status subscription request id is already in use",
                    ));
                    return;
                }
                let subscription = Subscription {
                    session: request.session.clone(),
                    instrument: request.instrument.clone(),
                    request_id,
                };
                out.push(status_report(&subscription, phase));
                debug!(session = %subscription.session, "installed security status subscription");
                self.subscriptions.insert(key, subscription);
            }
            MdSubscriptionAction::Snapshot => {
                let one_shot = Subscription {
                    session: request.session.clone(),
                    instrument: request.instrument.clone(),
                    request_id,
                };
                out.push(status_report(&one_shot, phase));
            }
            MdSubscriptionAction::Unsubscribe => {
                if self.subscriptions.remove(&key).is_none() {
                    out.push(reject(
                        request,
                        BusinessRejectReason::UnknownId,
                        "no subscription found for the security status request id",
                    ));
                }
            }
        }
    }

    /// Publishes the new phase to every subscriber.
    pub fn on_phase_changed(&self, phase: MarketPhase, out: &mut Vec<ClientNotification>) {
        for subscription in self.subscriptions.values() {
            out.push(status_report(subscription, phase));
        }
    }

    /// Drops every subscription belonging to the session.
    pub fn drop_session(&mut self, session: &Session) {
        self.subscriptions.retain(|(owner, _), _| owner != session);
    }
}

fn status_report(subscription: &Subscription, phase: MarketPhase) -> ClientNotification {
    ClientNotification::SecurityStatus(SecurityStatus {
        session: subscription.session.clone(),
        instrument: subscription.instrument.clone(),
        request_id: subscription.request_id.clone(),
        trading_phase: phase.trading_phase,
        trading_status: phase.trading_status,
    })
}

fn reject(
    request: &SecurityStatusRequest,
    reason: BusinessRejectReason,
    text: &str,
) -> ClientNotification {
    ClientNotification::BusinessReject(BusinessMessageReject {
        session: request.session.clone(),
        business_reject_reason: reason,
        text: RejectText::from(text),
        ref_message_type: RejectedMessageType::SecurityStatusRequest,
        ref_seq_num: request.seq_num,
        ref_id: request.request_id.as_ref().map(|id| id.value().to_string()),
    })
}
