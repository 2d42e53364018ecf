//! Routing and end-to-end reply-flow tests.
//!
//! These tests drive the execution system the way a protocol adapter does
//! and observe replies on the trading-reply channel. The channel is a
//! process-wide singleton, so every test serialises on one guard and binds
//! its own collecting receiver.

use crate::support::{instrument, placement, session};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use venue_core_rs::catalogue::InstrumentCatalogue;
use venue_core_rs::domain::{InstrumentDescriptor, OrderStatus, Price, Quantity, Side, TimeInForce};
use venue_core_rs::engine::{EngineConfig, MatchingEngine};
use venue_core_rs::execution::{ChannelReplyPublisher, EngineScheduler, ExecutionSystem};
use venue_core_rs::middleware::{
    self, TradingReplyReceiver, TradingRequestReceiver, TradingSessionEventReceiver,
};
use venue_core_rs::persistence::MarketStateExecutor;
use venue_core_rs::protocol::{
    ClientNotification, InstrumentStateRequest, MarketDataRequest, SessionTerminatedEvent,
};
use venue_core_rs::QueueConfig;

fn channel_guard() -> &'static Mutex<()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}

#[derive(Default)]
struct CollectingReplies {
    replies: Mutex<Vec<ClientNotification>>,
}

impl CollectingReplies {
    fn snapshot(&self) -> Vec<ClientNotification> {
        self.replies.lock().unwrap().clone()
    }

    fn wait_for(&self, count: usize) -> Vec<ClientNotification> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let replies = self.snapshot();
            if replies.len() >= count {
                return replies;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {count} replies");
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl TradingReplyReceiver for CollectingReplies {
    fn publish(&self, notification: ClientNotification) {
        self.replies.lock().unwrap().push(notification);
    }
}

struct Fixture {
    execution: Arc<ExecutionSystem>,
    scheduler: Arc<EngineScheduler>,
    replies: Arc<CollectingReplies>,
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Fixture {
    fn start() -> Self {
        crate::support::init_tracing();
        let guard = channel_guard().lock().unwrap_or_else(|poison| poison.into_inner());

        let catalogue = Arc::new(
            InstrumentCatalogue::build(vec![
                instrument(0, "AAPL", Some("US0378331005")),
                instrument(1, "MSFT", Some("US5949181045")),
            ])
            .unwrap(),
        );
        let engines: Vec<MatchingEngine> = catalogue
            .instruments()
            .map(|instrument| MatchingEngine::new(instrument.clone(), EngineConfig::default()))
            .collect();
        let scheduler = EngineScheduler::start(
            engines,
            Arc::new(ChannelReplyPublisher),
            QueueConfig::default(),
        );
        let execution = Arc::new(ExecutionSystem::new(catalogue, Arc::clone(&scheduler)));

        let replies = Arc::new(CollectingReplies::default());
        middleware::bind_trading_reply_receiver(replies.clone());

        Self { execution, scheduler, replies, _guard: guard }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        // Workers first, so no in-flight batch hits an unbound channel.
        self.scheduler.shutdown();
        middleware::unbind_trading_reply_receiver();
    }
}

#[test]
fn requests_are_routed_to_the_engine_owning_the_instrument() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    fixture.execution.process_placement(placement(
        "CLIENT1", "MSFT", "B", Side::Buy, 100.0, 50.00, TimeInForce::GoodTillCancel,
    ));

    let replies = fixture.replies.wait_for(2);
    // Each engine numbers its own orders from one.
    let mut venue_ids: Vec<u64> = replies
        .iter()
        .map(|notification| match notification {
            ClientNotification::PlacementConfirmation(confirmation) => {
                confirmation.venue_order_id.value()
            }
            other => panic!("expected confirmations, got {other:?}"),
        })
        .collect();
    venue_ids.sort_unstable();
    assert_eq!(venue_ids, vec![1, 1]);
}

#[test]
fn crossing_orders_yield_one_terminal_reply_per_request() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    fixture.execution.process_placement(placement(
        "CLIENT2", "AAPL", "B", Side::Sell, 40.0, 10.00, TimeInForce::ImmediateOrCancel,
    ));

    let replies = fixture.replies.wait_for(4);
    let confirmations = replies
        .iter()
        .filter(|n| matches!(n, ClientNotification::PlacementConfirmation(_)))
        .count();
    let executions = replies
        .iter()
        .filter(|n| matches!(n, ClientNotification::Execution(_)))
        .count();
    // One terminal confirmation per request; execution reports accompany
    // them as non-terminal notifications.
    assert_eq!(confirmations, 2);
    assert_eq!(executions, 2);

    // Replies of one engine preserve submission order.
    assert!(matches!(replies[0], ClientNotification::PlacementConfirmation(_)));
    assert!(matches!(replies[1], ClientNotification::PlacementConfirmation(_)));
}

#[test]
fn unresolvable_placement_is_rejected_with_generated_ids() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "TSLA", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));

    let replies = fixture.replies.wait_for(1);
    match &replies[0] {
        ClientNotification::PlacementReject(reject) => {
            assert_eq!(reject.reject_text.value(), "instrument is not found");
            assert_eq!(reject.venue_order_id.to_string().len(), 18);
            assert_eq!(
                reject.execution_id.value(),
                format!("{}-1", reject.venue_order_id)
            );
        }
        other => panic!("expected a placement reject, got {other:?}"),
    }
}

#[test]
fn empty_descriptor_draws_a_business_reject() {
    let fixture = Fixture::start();

    let mut request = placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    );
    request.instrument = InstrumentDescriptor::default();
    fixture.execution.process_placement(request);

    let replies = fixture.replies.wait_for(1);
    match &replies[0] {
        ClientNotification::BusinessReject(reject) => {
            assert_eq!(
                reject.text.value(),
                "instrument descriptor contains no usable identifier"
            );
        }
        other => panic!("expected a business reject, got {other:?}"),
    }
}

#[test]
fn market_data_request_must_name_exactly_one_instrument() {
    let fixture = Fixture::start();

    let mut no_instruments = MarketDataRequest::new(session("CLIENT1"));
    no_instruments.request_id = Some("md-1".into());
    fixture.execution.process_market_data_request(no_instruments);

    let mut two_instruments = MarketDataRequest::new(session("CLIENT1"));
    two_instruments.request_id = Some("md-2".into());
    two_instruments.instruments = vec![
        InstrumentDescriptor::for_symbol("AAPL"),
        InstrumentDescriptor::for_symbol("MSFT"),
    ];
    fixture.execution.process_market_data_request(two_instruments);

    let replies = fixture.replies.wait_for(2);
    let texts: Vec<&str> = replies
        .iter()
        .map(|notification| match notification {
            ClientNotification::MarketDataReject(reject) => {
                reject.reject_text.as_ref().unwrap().value()
            }
            other => panic!("expected market data rejects, got {other:?}"),
        })
        .collect();
    assert!(texts.contains(&"market data request contains no instruments"));
    assert!(texts.contains(&"market data request contains multiple instruments"));
}

#[test]
fn session_termination_fans_out_to_every_engine() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::Day,
    ));
    fixture.execution.process_placement(placement(
        "CLIENT1", "MSFT", "B", Side::Buy, 100.0, 50.00, TimeInForce::Day,
    ));
    fixture.replies.wait_for(2);

    fixture
        .execution
        .on_session_terminated(SessionTerminatedEvent { session: session("CLIENT1") });

    // Both engines must come back empty.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let mut instruments = Vec::new();
        fixture.execution.capture(&mut instruments);
        let resting: usize = instruments
            .iter()
            .map(|state| state.order_book.buy_orders.len() + state.order_book.sell_orders.len())
            .sum();
        if resting == 0 {
            break;
        }
        assert!(Instant::now() < deadline, "orders were not cancelled in time");
        std::thread::sleep(Duration::from_millis(5));
    }

    // No reply was addressed to the terminated session after the event
    // beyond its own earlier confirmations.
    let replies = fixture.replies.snapshot();
    assert_eq!(
        replies
            .iter()
            .filter(|n| matches!(n, ClientNotification::Execution(_)))
            .count(),
        0
    );
}

#[test]
fn instrument_state_request_is_answered_synchronously() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    fixture.replies.wait_for(1);

    let mut reply = venue_core_rs::protocol::InstrumentState::default();
    fixture.execution.provide_instrument_state(
        InstrumentStateRequest { instrument: InstrumentDescriptor::for_symbol("AAPL") },
        &mut reply,
    );
    assert_eq!(reply.best_bid_price, Some(Price::new(10.00)));
    assert_eq!(reply.current_bid_depth, Some(Quantity::new(100.0)));
    assert_eq!(reply.best_offer_price, None);
}

#[test]
fn fok_scenario_leaves_the_resting_book_unchanged() {
    let fixture = Fixture::start();

    fixture.execution.process_placement(placement(
        "CLIENT1", "AAPL", "S", Side::Sell, 50.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    fixture.replies.wait_for(1);
    fixture.execution.process_placement(placement(
        "CLIENT2", "AAPL", "F", Side::Buy, 80.0, 10.00, TimeInForce::FillOrKill,
    ));

    let replies = fixture.replies.wait_for(2);
    match &replies[1] {
        ClientNotification::Execution(report) => {
            assert_eq!(report.order_status, OrderStatus::Cancelled);
            assert_eq!(
                report.reject_text.as_ref().map(|t| t.value()),
                Some("insufficient liquidity for FOK")
            );
        }
        other => panic!("expected an execution report, got {other:?}"),
    }

    let mut reply = venue_core_rs::protocol::InstrumentState::default();
    fixture.execution.provide_instrument_state(
        InstrumentStateRequest { instrument: InstrumentDescriptor::for_symbol("AAPL") },
        &mut reply,
    );
    assert_eq!(reply.best_offer_price, Some(Price::new(10.00)));
    assert_eq!(reply.current_offer_depth, Some(Quantity::new(50.0)));
}
