//! Snapshot/restore round trips through the JSON persistence file.

use crate::support::{instrument, placement};
use std::sync::Mutex;
use venue_core_rs::domain::{Side, TimeInForce};
use venue_core_rs::engine::{EngineConfig, MatchingEngine};
use venue_core_rs::persistence::{
    InstrumentState, JsonMarketStateSerializer, MarketStateExecutor, MarketStateSerializer,
    PersistenceConfig, PersistenceController, RecoverMarketState, Snapshot, StoreMarketState,
};

/// A stand-in for the execution system: engines driven inline, no queues.
struct InlineExecutor {
    engines: Mutex<Vec<MatchingEngine>>,
}

impl InlineExecutor {
    fn new(engines: Vec<MatchingEngine>) -> Self {
        Self { engines: Mutex::new(engines) }
    }
}

impl MarketStateExecutor for InlineExecutor {
    fn capture(&self, instruments: &mut Vec<InstrumentState>) {
        for engine in self.engines.lock().unwrap().iter() {
            let mut state = InstrumentState::empty(engine.instrument().clone());
            engine.store_state(&mut state);
            instruments.push(state);
        }
    }

    fn restore(&self, instruments: Vec<InstrumentState>) {
        let mut engines = self.engines.lock().unwrap();
        for state in instruments {
            let engine = engines
                .iter_mut()
                .find(|engine| engine.instrument().symbol == state.instrument.symbol)
                .expect("recovered state matches an engine");
            engine.recover_state(state);
        }
    }
}

fn populated_engine() -> MatchingEngine {
    let mut engine = MatchingEngine::new(instrument(0, "AAPL", None), EngineConfig::default());
    for (index, price) in [10.00, 10.00, 9.99, 9.98, 9.97].iter().enumerate() {
        engine.execute_placement(placement(
            "CLIENT1",
            "AAPL",
            &format!("b{index}"),
            Side::Buy,
            100.0,
            *price,
            TimeInForce::GoodTillCancel,
        ));
    }
    for (index, price) in [10.05, 10.06, 10.07].iter().enumerate() {
        engine.execute_placement(placement(
            "CLIENT2",
            "AAPL",
            &format!("s{index}"),
            Side::Sell,
            50.0,
            *price,
            TimeInForce::GoodTillCancel,
        ));
    }
    // One trade so last_trade and the session extremes are populated.
    engine.execute_placement(placement(
        "CLIENT3", "AAPL", "x", Side::Sell, 20.0, 10.00, TimeInForce::ImmediateOrCancel,
    ));
    engine.take_notifications();
    engine
}

#[test]
fn snapshot_restore_round_trip_preserves_books_level_by_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market_state.json");
    let config =
        PersistenceConfig { enabled: true, file_path: path.to_str().unwrap().to_string() };

    // Store from a populated venue.
    let source = InlineExecutor::new(vec![populated_engine()]);
    let controller = PersistenceController::new(
        config.clone(),
        "XSIM",
        Box::new(JsonMarketStateSerializer::new()),
    );
    assert_eq!(controller.store(&source), StoreMarketState::Stored);

    let mut expected = Vec::new();
    source.capture(&mut expected);

    // Recover into a fresh venue with the same instruments.
    let target = InlineExecutor::new(vec![MatchingEngine::new(
        instrument(0, "AAPL", None),
        EngineConfig::default(),
    )]);
    assert_eq!(controller.recover(&target).code, RecoverMarketState::Recovered);

    let mut recovered = Vec::new();
    target.capture(&mut recovered);
    assert_eq!(recovered, expected);
}

#[test]
fn serializer_round_trip_is_the_identity_on_the_snapshot() {
    let executor = InlineExecutor::new(vec![populated_engine()]);
    let mut instruments = Vec::new();
    executor.capture(&mut instruments);
    let snapshot = Snapshot { venue_id: "XSIM".to_string(), instruments };

    let serializer = JsonMarketStateSerializer::new();
    let mut buffer = Vec::new();
    serializer.serialize(&snapshot, &mut buffer).unwrap();
    let decoded = serializer.deserialize(&mut buffer.as_slice()).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn malformed_file_reports_the_parse_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market_state.json");
    std::fs::write(
        &path,
        r#"{ "venue_id": "XSIM", "instruments": [ { "order_book": {} } ] }"#,
    )
    .unwrap();

    let controller = PersistenceController::new(
        PersistenceConfig { enabled: true, file_path: path.to_str().unwrap().to_string() },
        "XSIM",
        Box::new(JsonMarketStateSerializer::new()),
    );
    let result = controller.recover(&InlineExecutor::new(Vec::new()));
    assert_eq!(result.code, RecoverMarketState::PersistenceFileIsMalformed);
    assert_eq!(
        result.error.as_deref(),
        Some("failed to parse field 'snapshot.instruments[0].instrument': missing required field")
    );
}

#[test]
fn unknown_fields_in_the_file_are_rejected() {
    let serializer = JsonMarketStateSerializer::new();
    let text = r#"{ "venue_id": "XSIM", "instruments": [], "checksum": "abc" }"#;
    let error = serializer.deserialize(&mut text.as_bytes()).unwrap_err();
    assert_eq!(
        error.to_string(),
        "failed to parse field 'snapshot.checksum': unknown field"
    );
}
