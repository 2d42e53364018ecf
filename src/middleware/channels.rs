//! Process-wide named channels binding exactly one receiver each.
//!
//! A channel is a named slot holding at most one receiver; sends dispatch
//! synchronously to whatever is bound at that moment. Binding a new
//! receiver replaces the previous one (rebinding is how tests swap in
//! probes). Sending into an unbound channel is reported to the caller as
//! [`ChannelError::Unbound`] — never silently dropped.

use crate::protocol::{
    ClientNotification, InstrumentState, InstrumentStateRequest, MarketDataRequest,
    OrderCancellationRequest, OrderModificationRequest, OrderPlacementRequest,
    SecurityStatusRequest, SessionTerminatedEvent,
};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Failure to dispatch through a middleware channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel has no bound receiver.
    #[error("channel '{0}' has no bound receiver")]
    Unbound(&'static str),
}

/// A named slot holding at most one receiver.
///
/// The internal lock is held in read mode for the whole synchronous
/// dispatch, which serialises rebinding against in-flight sends.
pub struct Channel<T: ?Sized + Send + Sync> {
    name: &'static str,
    receiver: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized + Send + Sync> Channel<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, receiver: RwLock::new(None) }
    }

    /// Binds a receiver, replacing any previous one.
    pub fn bind(&self, receiver: Arc<T>) {
        debug!(channel = self.name, "binding channel receiver");
        *self.receiver.write().expect("channel lock poisoned") = Some(receiver);
    }

    /// Unbinds the current receiver, if any.
    pub fn unbind(&self) {
        debug!(channel = self.name, "unbinding channel receiver");
        *self.receiver.write().expect("channel lock poisoned") = None;
    }

    /// Dispatches synchronously to the bound receiver.
    pub fn send<R>(&self, dispatch: impl FnOnce(&T) -> R) -> Result<R, ChannelError> {
        let guard = self.receiver.read().expect("channel lock poisoned");
        match guard.as_ref() {
            Some(receiver) => Ok(dispatch(receiver)),
            None => Err(ChannelError::Unbound(self.name)),
        }
    }
}

/// Receiver side of the trading-request channel.
///
/// Bound by the trading system at startup; called by protocol adapters.
pub trait TradingRequestReceiver: Send + Sync {
    fn process_placement(&self, request: OrderPlacementRequest);
    fn process_modification(&self, request: OrderModificationRequest);
    fn process_cancellation(&self, request: OrderCancellationRequest);
    fn process_market_data_request(&self, request: MarketDataRequest);
    fn process_security_status_request(&self, request: SecurityStatusRequest);
    /// Synchronous ask: the receiver fills `reply` before returning.
    fn provide_instrument_state(&self, request: InstrumentStateRequest, reply: &mut InstrumentState);
}

/// Receiver side of the trading-reply channel (the egress adapter).
pub trait TradingReplyReceiver: Send + Sync {
    fn publish(&self, notification: ClientNotification);
}

/// Receiver side of the trading-session-event channel.
pub trait TradingSessionEventReceiver: Send + Sync {
    fn on_session_terminated(&self, event: SessionTerminatedEvent);
}

/// Generator administration request/reply pairs (peripheral surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartGenerationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopGenerationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStatusRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationReply {
    Started,
    Stopped,
    Running,
    Idle,
}

/// Receiver side of the generator-admin channel.
pub trait GeneratorAdminReceiver: Send + Sync {
    fn start_generation(&self, request: StartGenerationRequest) -> GenerationReply;
    fn stop_generation(&self, request: StopGenerationRequest) -> GenerationReply;
    fn generation_status(&self, request: GenerationStatusRequest) -> GenerationReply;
}

static TRADING_REQUEST: Channel<dyn TradingRequestReceiver> = Channel::new("trading-request");
static TRADING_REPLY: Channel<dyn TradingReplyReceiver> = Channel::new("trading-reply");
static TRADING_SESSION_EVENT: Channel<dyn TradingSessionEventReceiver> =
    Channel::new("trading-session-event");
static GENERATOR_ADMIN: Channel<dyn GeneratorAdminReceiver> = Channel::new("generator-admin");

pub fn bind_trading_request_receiver(receiver: Arc<dyn TradingRequestReceiver>) {
    TRADING_REQUEST.bind(receiver);
}

pub fn unbind_trading_request_receiver() {
    TRADING_REQUEST.unbind();
}

pub fn bind_trading_reply_receiver(receiver: Arc<dyn TradingReplyReceiver>) {
    TRADING_REPLY.bind(receiver);
}

pub fn unbind_trading_reply_receiver() {
    TRADING_REPLY.unbind();
}

pub fn bind_trading_session_event_receiver(receiver: Arc<dyn TradingSessionEventReceiver>) {
    TRADING_SESSION_EVENT.bind(receiver);
}

pub fn unbind_trading_session_event_receiver() {
    TRADING_SESSION_EVENT.unbind();
}

pub fn bind_generator_admin_receiver(receiver: Arc<dyn GeneratorAdminReceiver>) {
    GENERATOR_ADMIN.bind(receiver);
}

pub fn unbind_generator_admin_receiver() {
    GENERATOR_ADMIN.unbind();
}

pub fn send_order_placement(request: OrderPlacementRequest) -> Result<(), ChannelError> {
    TRADING_REQUEST.send(|receiver| receiver.process_placement(request))
}

pub fn send_order_modification(request: OrderModificationRequest) -> Result<(), ChannelError> {
    TRADING_REQUEST.send(|receiver| receiver.process_modification(request))
}

pub fn send_order_cancellation(request: OrderCancellationRequest) -> Result<(), ChannelError> {
    TRADING_REQUEST.send(|receiver| receiver.process_cancellation(request))
}

pub fn send_market_data_request(request: MarketDataRequest) -> Result<(), ChannelError> {
    TRADING_REQUEST.send(|receiver| receiver.process_market_data_request(request))
}

pub fn send_security_status_request(request: SecurityStatusRequest) -> Result<(), ChannelError> {
    TRADING_REQUEST.send(|receiver| receiver.process_security_status_request(request))
}

/// Synchronous instrument-state ask; returns the filled reply.
pub fn send_instrument_state_request(
    request: InstrumentStateRequest,
) -> Result<InstrumentState, ChannelError> {
    TRADING_REQUEST.send(|receiver| {
        let mut reply = InstrumentState::default();
        receiver.provide_instrument_state(request, &mut reply);
        reply
    })
}

pub fn send_client_notification(notification: ClientNotification) -> Result<(), ChannelError> {
    TRADING_REPLY.send(|receiver| receiver.publish(notification))
}

pub fn send_session_terminated(event: SessionTerminatedEvent) -> Result<(), ChannelError> {
    TRADING_SESSION_EVENT.send(|receiver| receiver.on_session_terminated(event))
}

pub fn send_start_generation(
    request: StartGenerationRequest,
) -> Result<GenerationReply, ChannelError> {
    GENERATOR_ADMIN.send(|receiver| receiver.start_generation(request))
}

pub fn send_stop_generation(
    request: StopGenerationRequest,
) -> Result<GenerationReply, ChannelError> {
    GENERATOR_ADMIN.send(|receiver| receiver.stop_generation(request))
}

pub fn send_generation_status(
    request: GenerationStatusRequest,
) -> Result<GenerationReply, ChannelError> {
    GENERATOR_ADMIN.send(|receiver| receiver.generation_status(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Probe {
        published: Mutex<Vec<&'static str>>,
    }

    impl TradingReplyReceiver for Probe {
        fn publish(&self, _notification: ClientNotification) {
            self.published.lock().unwrap().push("notification");
        }
    }

    // Channel statics are process-wide; this test owns a private channel
    // instance instead to stay independent of binding order elsewhere.
    #[test]
    fn send_to_unbound_channel_reports_the_channel_name() {
        let channel: Channel<dyn TradingReplyReceiver> = Channel::new("probe-channel");
        let result = channel.send(|_| ());
        assert_eq!(result, Err(ChannelError::Unbound("probe-channel")));
        assert_eq!(
            result.unwrap_err().to_string(),
            "channel 'probe-channel' has no bound receiver"
        );
    }

    #[test]
    fn binding_replaces_the_previous_receiver() {
        let channel: Channel<dyn TradingReplyReceiver> = Channel::new("probe-channel");
        let first = Arc::new(Probe { published: Mutex::new(Vec::new()) });
        let second = Arc::new(Probe { published: Mutex::new(Vec::new()) });

        channel.bind(first.clone());
        channel.bind(second.clone());
        channel
            .send(|receiver| {
                receiver.publish(ClientNotification::MarketDataUpdate(
                    crate::protocol::MarketDataUpdate {
                        session: crate::domain::Session::Generator,
                        request_id: None,
                        entries: Vec::new(),
                    },
                ));
            })
            .unwrap();

        assert!(first.published.lock().unwrap().is_empty());
        assert_eq!(second.published.lock().unwrap().len(), 1);
    }

    #[test]
    fn unbinding_clears_the_slot() {
        let channel: Channel<dyn TradingReplyReceiver> = Channel::new("probe-channel");
        channel.bind(Arc::new(Probe { published: Mutex::new(Vec::new()) }));
        channel.unbind();
        assert!(channel.send(|_| ()).is_err());
    }
}
