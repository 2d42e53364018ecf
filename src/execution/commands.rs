//! Typed commands executed on an engine's queue.

use crate::engine::{MatchingEngine, PhaseTransition, Tick};
use crate::persistence;
use crate::protocol::{
    ClientNotification, MarketDataRequest, OrderCancellationRequest, OrderModificationRequest,
    OrderPlacementRequest, SecurityStatusRequest, SessionTerminatedEvent,
};
use crossbeam::channel::Sender;

/// A unit of work for one engine.
///
/// Replying commands produce a batch of client notifications which the
/// worker hands to the egress publisher after the engine returns. Action
/// commands answer through a rendezvous channel instead. Event commands are
/// replying commands emitted by the event loop rather than a client.
pub enum Command {
    PlaceOrder(OrderPlacementRequest),
    AmendOrder(OrderModificationRequest),
    CancelOrder(OrderCancellationRequest),
    ProcessMarketDataRequest(MarketDataRequest),
    ProcessSecurityStatusRequest(SecurityStatusRequest),
    CaptureInstrumentState {
        reply: Sender<crate::protocol::InstrumentState>,
    },
    StoreState {
        reply: Sender<persistence::InstrumentState>,
    },
    RecoverState(Box<persistence::InstrumentState>),
    NotifyClientDisconnected(SessionTerminatedEvent),
    Tick(Tick),
    PhaseTransition(PhaseTransition),
}

impl Command {
    /// Command name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlaceOrder(_) => "PlaceOrder",
            Command::AmendOrder(_) => "AmendOrder",
            Command::CancelOrder(_) => "CancelOrder",
            Command::ProcessMarketDataRequest(_) => "ProcessMarketDataRequest",
            Command::ProcessSecurityStatusRequest(_) => "ProcessSecurityStatusRequest",
            Command::CaptureInstrumentState { .. } => "CaptureInstrumentState",
            Command::StoreState { .. } => "StoreState",
            Command::RecoverState(_) => "RecoverState",
            Command::NotifyClientDisconnected(_) => "NotifyClientDisconnected",
            Command::Tick(_) => "Tick",
            Command::PhaseTransition(_) => "PhaseTransition",
        }
    }

    /// Runs the command against its engine, returning the notification
    /// batch to publish (empty for action commands).
    pub(crate) fn execute(self, engine: &mut MatchingEngine) -> Vec<ClientNotification> {
        match self {
            Command::PlaceOrder(request) => {
                engine.execute_placement(request);
                engine.take_notifications()
            }
            Command::AmendOrder(request) => {
                engine.execute_modification(request);
                engine.take_notifications()
            }
            Command::CancelOrder(request) => {
                engine.execute_cancellation(request);
                engine.take_notifications()
            }
            Command::ProcessMarketDataRequest(request) => {
                engine.execute_market_data_request(request);
                engine.take_notifications()
            }
            Command::ProcessSecurityStatusRequest(request) => {
                engine.execute_security_status_request(request);
                engine.take_notifications()
            }
            Command::CaptureInstrumentState { reply } => {
                let mut state = crate::protocol::InstrumentState::default();
                engine.provide_state(&mut state);
                let _ = reply.send(state);
                Vec::new()
            }
            Command::StoreState { reply } => {
                let mut state =
                    persistence::InstrumentState::empty(engine.instrument().clone());
                engine.store_state(&mut state);
                let _ = reply.send(state);
                Vec::new()
            }
            Command::RecoverState(state) => {
                engine.recover_state(*state);
                Vec::new()
            }
            Command::NotifyClientDisconnected(event) => {
                engine.handle_session_terminated(&event);
                engine.take_notifications()
            }
            Command::Tick(tick) => {
                engine.handle_tick(tick);
                engine.take_notifications()
            }
            Command::PhaseTransition(transition) => {
                engine.handle_phase_transition(transition);
                engine.take_notifications()
            }
        }
    }
}
