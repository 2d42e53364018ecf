//! The engine registry and request router.

use crate::catalogue::{InstrumentCatalogue, ResolutionError};
use crate::domain::{InstrumentId, RejectedMessageType};
use crate::engine::{PhaseTransition, Tick};
use crate::execution::commands::Command;
use crate::execution::queue::{EngineScheduler, QueueError};
use crate::execution::reject::{REJECT_QUEUE_OVERLOAD, RejectNotifier};
use crate::middleware::{TradingRequestReceiver, TradingSessionEventReceiver};
use crate::persistence::{InstrumentState, MarketStateExecutor};
use crate::protocol::{
    InstrumentStateRequest, MarketDataRequest, OrderCancellationRequest,
    OrderModificationRequest, OrderPlacementRequest, SecurityStatusRequest,
    SessionTerminatedEvent,
};
use crossbeam::channel::bounded;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

const STATE_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Routes every inbound request to the engine owning its instrument.
///
/// Resolution failures are answered with typed rejects on the reply
/// channel; events and state requests fan out to every engine. One
/// instance is bound as the trading-request and session-event receiver.
pub struct ExecutionSystem {
    catalogue: Arc<InstrumentCatalogue>,
    scheduler: Arc<EngineScheduler>,
    rejects: RejectNotifier,
}

impl ExecutionSystem {
    #[must_use]
    pub fn new(catalogue: Arc<InstrumentCatalogue>, scheduler: Arc<EngineScheduler>) -> Self {
        Self { catalogue, scheduler, rejects: RejectNotifier }
    }

    /// Emits a tick to every engine through the normal queue path.
    pub fn broadcast_tick(&self, tick: Tick) {
        if let Err(cause) = self.scheduler.broadcast(|| Command::Tick(tick)) {
            error!(%cause, "tick broadcast failed");
        }
    }

    /// Emits a phase transition to every engine.
    pub fn broadcast_phase_transition(&self, transition: PhaseTransition) {
        if let Err(cause) = self.scheduler.broadcast(|| Command::PhaseTransition(transition)) {
            error!(%cause, "phase transition broadcast failed");
        }
    }

    fn unicast(
        &self,
        instrument_id: InstrumentId,
        command: Command,
    ) -> Result<(), QueueError> {
        self.scheduler.enqueue(instrument_id, command)
    }

    fn report_overload(
        &self,
        session: &crate::domain::Session,
        ref_message_type: RejectedMessageType,
        cause: &QueueError,
    ) {
        error!(%cause, "request was not enqueued");
        self.rejects.business_reject(session.clone(), ref_message_type, REJECT_QUEUE_OVERLOAD);
    }
}

impl TradingRequestReceiver for ExecutionSystem {
    fn process_placement(&self, request: OrderPlacementRequest) {
        match self.catalogue.resolve(&request.instrument) {
            Ok(instrument_id) => {
                let session = request.session.clone();
                if let Err(cause) = self.unicast(instrument_id, Command::PlaceOrder(request)) {
                    self.report_overload(&session, RejectedMessageType::OrderPlacement, &cause);
                }
            }
            Err(error) => self.rejects.reject_placement(&request, error),
        }
    }

    fn process_modification(&self, request: OrderModificationRequest) {
        match self.catalogue.resolve(&request.instrument) {
            Ok(instrument_id) => {
                let session = request.session.clone();
                if let Err(cause) = self.unicast(instrument_id, Command::AmendOrder(request)) {
                    self.report_overload(&session, RejectedMessageType::OrderModification, &cause);
                }
            }
            Err(error) => self.rejects.reject_modification(&request, error),
        }
    }

    fn process_cancellation(&self, request: OrderCancellationRequest) {
        match self.catalogue.resolve(&request.instrument) {
            Ok(instrument_id) => {
                let session = request.session.clone();
                if let Err(cause) = self.unicast(instrument_id, Command::CancelOrder(request)) {
                    self.report_overload(&session, RejectedMessageType::OrderCancellation, &cause);
                }
            }
            Err(error) => self.rejects.reject_cancellation(&request, error),
        }
    }

    fn process_market_data_request(&self, request: MarketDataRequest) {
        let instrument = match request.instruments.as_slice() {
            [] => {
                self.rejects.reject_market_data(
                    &request,
                    "market data request contains no instruments",
                    false,
                );
                return;
            }
            [instrument] => instrument,
            _ => {
                self.rejects.reject_market_data(
                    &request,
                    "market data request contains multiple instruments",
                    false,
                );
                return;
            }
        };

        match self.catalogue.resolve(instrument) {
            Ok(instrument_id) => {
                let session = request.session.clone();
                if let Err(cause) =
                    self.unicast(instrument_id, Command::ProcessMarketDataRequest(request))
                {
                    self.report_overload(&session, RejectedMessageType::MarketDataRequest, &cause);
                }
            }
            Err(ResolutionError::NotFound) => {
                self.rejects.reject_market_data(&request, "instrument is not found", true);
            }
            Err(ResolutionError::Ambiguous) => {
                self.rejects.reject_market_data(
                    &request,
                    "instrument descriptor is ambiguous",
                    true,
                );
            }
            Err(ResolutionError::Empty) => {
                self.rejects.reject_market_data(
                    &request,
                    "instrument descriptor contains no usable identifier",
                    false,
                );
            }
        }
    }

    fn process_security_status_request(&self, request: SecurityStatusRequest) {
        match self.catalogue.resolve(&request.instrument) {
            Ok(instrument_id) => {
                let session = request.session.clone();
                if let Err(cause) =
                    self.unicast(instrument_id, Command::ProcessSecurityStatusRequest(request))
                {
                    self.report_overload(
                        &session,
                        RejectedMessageType::SecurityStatusRequest,
                        &cause,
                    );
                }
            }
            Err(error) => self.rejects.reject_security_status(&request, error),
        }
    }

    fn provide_instrument_state(
        &self,
        request: InstrumentStateRequest,
        reply: &mut crate::protocol::InstrumentState,
    ) {
        let instrument_id = match self.catalogue.resolve(&request.instrument) {
            Ok(instrument_id) => instrument_id,
            Err(error) => {
                warn!(%error, "instrument state request is unresolvable");
                return;
            }
        };

        let (reply_tx, reply_rx) = bounded(1);
        if let Err(cause) =
            self.unicast(instrument_id, Command::CaptureInstrumentState { reply: reply_tx })
        {
            error!(%cause, "instrument state request was not enqueued");
            return;
        }
        match reply_rx.recv_timeout(STATE_REPLY_TIMEOUT) {
            Ok(state) => *reply = state,
            Err(cause) => error!(%cause, "instrument state reply was not received"),
        }
    }
}

impl TradingSessionEventReceiver for ExecutionSystem {
    fn on_session_terminated(&self, event: SessionTerminatedEvent) {
        if let Err(cause) = self
            .scheduler
            .broadcast(|| Command::NotifyClientDisconnected(event.clone()))
        {
            error!(%cause, "session termination broadcast failed");
        }
    }
}

impl MarketStateExecutor for ExecutionSystem {
    /// Visits every engine in catalogue order, collecting one state record
    /// per instrument.
    fn capture(&self, instruments: &mut Vec<InstrumentState>) {
        for instrument_id in self.scheduler.instrument_order().to_vec() {
            let (reply_tx, reply_rx) = bounded(1);
            if let Err(cause) =
                self.scheduler.enqueue(instrument_id, Command::StoreState { reply: reply_tx })
            {
                error!(%cause, instrument = instrument_id.value(), "state capture not enqueued");
                continue;
            }
            match reply_rx.recv_timeout(STATE_REPLY_TIMEOUT) {
                Ok(state) => instruments.push(state),
                Err(cause) => {
                    error!(%cause, instrument = instrument_id.value(), "state capture timed out");
                }
            }
        }
    }

    /// Routes each recovered state to its engine by instrument identity,
    /// never by array position.
    fn restore(&self, instruments: Vec<InstrumentState>) {
        for state in instruments {
            let descriptor = state.instrument.descriptor();
            match self.catalogue.resolve(&descriptor) {
                Ok(instrument_id) => {
                    if let Err(cause) = self
                        .scheduler
                        .enqueue(instrument_id, Command::RecoverState(Box::new(state)))
                    {
                        error!(%cause, "state restore not enqueued");
                    }
                }
                Err(error) => {
                    error!(
                        symbol = %state.instrument.symbol,
                        %error,
                        "recovered state does not match any catalogue instrument"
                    );
                }
            }
        }
    }
}
