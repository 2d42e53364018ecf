//! Market-data subscription flow against a live engine.

use crate::support::{instrument, placement, session};
use venue_core_rs::domain::{
    InstrumentDescriptor, MdEntryAction, MdEntryType, MdSubscriptionAction, MdUpdateMode, OrderId,
    OrderType, Price, Quantity, Side, TimeInForce,
};
use venue_core_rs::engine::{EngineConfig, MatchingEngine};
use venue_core_rs::protocol::{
    ClientNotification, MarketDataRequest, OrderCancellationRequest, OrderModificationRequest,
};

fn engine() -> MatchingEngine {
    MatchingEngine::new(instrument(0, "AAPL", None), EngineConfig::default())
}

fn subscribe(engine: &mut MatchingEngine) -> Vec<ClientNotification> {
    let mut request = MarketDataRequest::new(session("VIEWER"));
    request.request_id = Some("md-1".into());
    request.action = Some(MdSubscriptionAction::Subscribe);
    request.update_mode = Some(MdUpdateMode::SnapshotPlusUpdates);
    request.entry_types = vec![MdEntryType::Bid, MdEntryType::Offer];
    request.depth = Some(1);
    request.instruments = vec![InstrumentDescriptor::for_symbol("AAPL")];
    engine.execute_market_data_request(request);
    engine.take_notifications()
}

fn updates(notifications: &[ClientNotification]) -> Vec<&venue_core_rs::protocol::MarketDataUpdate> {
    notifications
        .iter()
        .filter_map(|notification| match notification {
            ClientNotification::MarketDataUpdate(update) => Some(update),
            _ => None,
        })
        .collect()
}

#[test]
fn subscription_sees_new_change_delete_for_a_bid_lifecycle() {
    let mut engine = engine();

    // Initial snapshot over an empty book has no entries.
    let replies = subscribe(&mut engine);
    match &replies[0] {
        ClientNotification::MarketDataSnapshot(snapshot) => assert!(snapshot.entries.is_empty()),
        other => panic!("expected a snapshot, got {other:?}"),
    }

    // New level.
    engine.execute_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    let replies = engine.take_notifications();
    let update = updates(&replies)[0];
    assert_eq!(update.entries.len(), 1);
    assert_eq!(update.entries[0].entry_type, MdEntryType::Bid);
    assert_eq!(update.entries[0].action, Some(MdEntryAction::New));
    assert_eq!(update.entries[0].price, Some(Price::new(10.00)));
    assert_eq!(update.entries[0].quantity, Some(Quantity::new(100.0)));

    // Quantity change at the level.
    let mut modification = OrderModificationRequest::new(
        session("CLIENT1"),
        InstrumentDescriptor::for_symbol("AAPL"),
    );
    modification.venue_order_id = Some(OrderId::new(1));
    modification.client_order_id = Some("A2".into());
    modification.side = Some(Side::Buy);
    modification.order_type = Some(OrderType::Limit);
    modification.order_price = Some(Price::new(10.00));
    modification.quantity = Some(Quantity::new(60.0));
    modification.time_in_force = Some(TimeInForce::GoodTillCancel);
    engine.execute_modification(modification);
    let replies = engine.take_notifications();
    let update = updates(&replies)[0];
    assert_eq!(update.entries[0].action, Some(MdEntryAction::Change));
    assert_eq!(update.entries[0].quantity, Some(Quantity::new(60.0)));

    // Level disappears.
    let mut cancellation = OrderCancellationRequest::new(
        session("CLIENT1"),
        InstrumentDescriptor::for_symbol("AAPL"),
    );
    cancellation.venue_order_id = Some(OrderId::new(1));
    cancellation.side = Some(Side::Buy);
    engine.execute_cancellation(cancellation);
    let replies = engine.take_notifications();
    let update = updates(&replies)[0];
    assert_eq!(update.entries[0].action, Some(MdEntryAction::Delete));
}

#[test]
fn trade_subscription_receives_trades_and_price_extremes() {
    let mut engine = engine();
    let mut request = MarketDataRequest::new(session("VIEWER"));
    request.request_id = Some("md-t".into());
    request.action = Some(MdSubscriptionAction::Subscribe);
    request.update_mode = Some(MdUpdateMode::SnapshotPlusUpdates);
    request.entry_types =
        vec![MdEntryType::Trade, MdEntryType::LowPrice, MdEntryType::HighPrice];
    request.instruments = vec![InstrumentDescriptor::for_symbol("AAPL")];
    engine.execute_market_data_request(request);
    engine.take_notifications();

    engine.execute_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Sell, 50.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    engine.execute_placement(placement(
        "CLIENT2", "AAPL", "B", Side::Buy, 50.0, 10.00, TimeInForce::ImmediateOrCancel,
    ));
    let replies = engine.take_notifications();
    let update = updates(&replies)[0];

    let entry_types: Vec<MdEntryType> =
        update.entries.iter().map(|entry| entry.entry_type).collect();
    assert!(entry_types.contains(&MdEntryType::Trade));
    assert!(entry_types.contains(&MdEntryType::LowPrice));
    assert!(entry_types.contains(&MdEntryType::HighPrice));

    let trade = update
        .entries
        .iter()
        .find(|entry| entry.entry_type == MdEntryType::Trade)
        .unwrap();
    assert_eq!(trade.price, Some(Price::new(10.00)));
    assert_eq!(trade.quantity, Some(Quantity::new(50.0)));
    assert_eq!(trade.aggressor_side, Some(Side::Buy));
}

#[test]
fn one_shot_snapshot_installs_no_subscription() {
    let mut engine = engine();
    engine.execute_placement(placement(
        "CLIENT1", "AAPL", "A", Side::Buy, 100.0, 10.00, TimeInForce::GoodTillCancel,
    ));
    engine.take_notifications();

    let mut request = MarketDataRequest::new(session("VIEWER"));
    request.request_id = Some("md-s".into());
    request.action = Some(MdSubscriptionAction::Snapshot);
    request.entry_types = vec![MdEntryType::Bid];
    request.instruments = vec![InstrumentDescriptor::for_symbol("AAPL")];
    engine.execute_market_data_request(request);
    let replies = engine.take_notifications();
    match &replies[0] {
        ClientNotification::MarketDataSnapshot(snapshot) => {
            assert_eq!(snapshot.entries.len(), 1);
            assert_eq!(snapshot.entries[0].price, Some(Price::new(10.00)));
        }
        other => panic!("expected a snapshot, got {other:?}"),
    }

    // A later book change must not reach the one-shot requester.
    engine.execute_placement(placement(
        "CLIENT1", "AAPL", "B", Side::Buy, 10.0, 10.01, TimeInForce::GoodTillCancel,
    ));
    let replies = engine.take_notifications();
    assert!(updates(&replies).is_empty());
}
