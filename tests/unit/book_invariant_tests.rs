//! Property tests over the book invariants.

use crate::support::{instrument, placement};
use proptest::prelude::*;
use venue_core_rs::domain::{Price, Quantity, Side, TimeInForce};
use venue_core_rs::engine::{EngineConfig, MatchingEngine};

#[derive(Debug, Clone)]
struct PlacementOp {
    buy: bool,
    price_ticks: u32,
    lots: u32,
    immediate: bool,
}

fn placement_op() -> impl Strategy<Value = PlacementOp> {
    (any::<bool>(), 990_u32..=1010, 1_u32..=20, any::<bool>()).prop_map(
        |(buy, price_ticks, lots, immediate)| PlacementOp { buy, price_ticks, lots, immediate },
    )
}

fn check_invariants(engine: &MatchingEngine) {
    let book = engine.book();
    let quantity_tick = engine.instrument().quantity_tick;
    let price_tick = engine.instrument().price_tick;

    // Buy side strictly decreasing, sell side strictly increasing.
    let bid_prices: Vec<Price> = book.levels(true).map(|(price, _)| price).collect();
    assert!(bid_prices.windows(2).all(|pair| pair[0] > pair[1]));
    let offer_prices: Vec<Price> = book.levels(false).map(|(price, _)| price).collect();
    assert!(offer_prices.windows(2).all(|pair| pair[0] < pair[1]));

    // No crossed book is ever observable.
    if let (Some((best_bid, _)), Some((best_offer, _))) = (book.best(true), book.best(false)) {
        assert!(best_bid < best_offer, "crossed book: {best_bid} >= {best_offer}");
    }

    for is_buy in [true, false] {
        for order in book.orders(is_buy) {
            assert!(order.cum_executed_quantity < order.total_quantity);
            assert!(order.total_quantity.respects_tick(quantity_tick));
            assert!(order.cum_executed_quantity >= Quantity::ZERO);
            assert!(order.cum_executed_quantity.respects_tick(quantity_tick));
            assert!(order.order_price.respects_tick(price_tick));
        }
    }

    // Within a level: acceptance times never decrease, ties resolve by
    // ascending order id.
    for is_buy in [true, false] {
        let mut per_level: Option<Price> = None;
        let mut previous: Option<(venue_core_rs::domain::OrderTime, u64)> = None;
        for order in book.orders(is_buy) {
            if per_level != Some(order.order_price) {
                per_level = Some(order.order_price);
                previous = None;
            }
            if let Some((time, id)) = previous {
                assert!(order.order_time.value() >= time.value());
                if order.order_time == time {
                    assert!(order.order_id.value() > id);
                }
            }
            previous = Some((order.order_time, order.order_id.value()));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_placement_streams_never_violate_book_invariants(
        ops in proptest::collection::vec(placement_op(), 1..60)
    ) {
        let mut engine =
            MatchingEngine::new(instrument(0, "AAPL", None), EngineConfig::default());

        for (index, op) in ops.iter().enumerate() {
            let side = if op.buy { Side::Buy } else { Side::Sell };
            let time_in_force = if op.immediate {
                TimeInForce::ImmediateOrCancel
            } else {
                TimeInForce::GoodTillCancel
            };
            engine.execute_placement(placement(
                "CLIENT1",
                "AAPL",
                &format!("c{index}"),
                side,
                f64::from(op.lots),
                f64::from(op.price_ticks) * 0.01,
                time_in_force,
            ));
            engine.take_notifications();
            check_invariants(&engine);
        }
    }

    #[test]
    fn ioc_orders_are_never_observable_in_the_book(
        ops in proptest::collection::vec(placement_op(), 1..40)
    ) {
        let mut engine =
            MatchingEngine::new(instrument(0, "AAPL", None), EngineConfig::default());

        let mut ioc_ids = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            let side = if op.buy { Side::Buy } else { Side::Sell };
            let time_in_force = if op.immediate {
                TimeInForce::ImmediateOrCancel
            } else {
                TimeInForce::GoodTillCancel
            };
            engine.execute_placement(placement(
                "CLIENT1",
                "AAPL",
                &format!("c{index}"),
                side,
                f64::from(op.lots),
                f64::from(op.price_ticks) * 0.01,
                time_in_force,
            ));
            for notification in engine.take_notifications() {
                if let venue_core_rs::protocol::ClientNotification::PlacementConfirmation(c) =
                    notification
                {
                    if op.immediate {
                        ioc_ids.push(c.venue_order_id);
                    }
                }
            }

            for is_buy in [true, false] {
                for order in engine.book().orders(is_buy) {
                    prop_assert!(!ioc_ids.contains(&order.order_id));
                }
            }
        }
    }
}
