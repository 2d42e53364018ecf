//! The price-time-priority matching loop.

use crate::book::book::OrderBook;
use crate::book::order::LimitOrder;
use crate::domain::{Price, Quantity, QuantityTick, Side};
use std::collections::VecDeque;
use tracing::trace;

/// One execution against a resting order.
#[derive(Debug, Clone)]
pub struct Fill {
    /// State of the resting order after the fill was applied.
    pub resting: LimitOrder,
    /// Execution price; always the resting order's price.
    pub price: Price,
    /// Executed quantity of this step.
    pub quantity: Quantity,
    /// Whether the fill removed the resting order from the book.
    pub resting_fully_filled: bool,
}

impl OrderBook {
    /// Total open quantity the aggressor could execute against, walking the
    /// opposite side while its levels cross `limit_price` (every level for
    /// market orders). Used for the fill-or-kill all-or-none check.
    #[must_use]
    pub fn crossable_quantity(&self, side: Side, limit_price: Option<Price>) -> Quantity {
        let mut total = Quantity::ZERO;
        for (price, level) in self.side_iter(!side.is_buy()) {
            if !crosses(side, *price, limit_price) {
                break;
            }
            total = total.add(Self::level_quantity(level));
        }
        total
    }

    /// Executes an incoming order against the opposite side.
    ///
    /// Levels are consumed best-first; within a level, orders fill head-first
    /// in arrival order (orders accepted within the same microsecond entered
    /// the queue in ascending `order_id` order, which is the tie-break).
    /// Each step executes `min(remaining, resting leaves)` truncated to the
    /// quantity tick at the resting order's price. Returns the fills in
    /// execution order; the caller is responsible for residual handling.
    pub fn match_incoming(
        &mut self,
        side: Side,
        limit_price: Option<Price>,
        quantity: Quantity,
        quantity_tick: QuantityTick,
    ) -> Vec<Fill> {
        let opposite_is_buy = !side.is_buy();
        let mut remaining = quantity;
        let mut fills = Vec::new();

        while !remaining.is_zero() {
            let Some(level_price) = self.top_price(opposite_is_buy) else { break };
            if !crosses(side, level_price, limit_price) {
                break;
            }

            let (fill, removed) = {
                let level = self
                    .side_mut(opposite_is_buy)
                    .get_mut(&level_price)
                    .expect("top price points at a missing level");
                let head = level.front_mut().expect("levels are never left empty");

                let step = remaining.min(head.leaves_quantity()).truncate_to_tick(quantity_tick);
                if step.is_zero() {
                    // Residual below one quantity tick cannot trade.
                    break;
                }

                head.apply_fill(step);
                let fully_filled = head.is_fully_executed();
                let snapshot = head.clone();

                let removed = if fully_filled {
                    let order = level.pop_front().expect("head was just inspected");
                    Some(order)
                } else {
                    None
                };

                (
                    Fill {
                        resting: snapshot,
                        price: level_price,
                        quantity: step,
                        resting_fully_filled: fully_filled,
                    },
                    removed,
                )
            };

            if let Some(order) = removed {
                let side_map = self.side_mut(opposite_is_buy);
                if side_map.get(&level_price).is_some_and(VecDeque::is_empty) {
                    side_map.remove(&level_price);
                }
                self.locations.remove(&order.order_id);
                self.unindex_client_id(&order);
            }

            remaining = remaining.saturating_sub(fill.quantity);
            trace!(
                resting_order = fill.resting.order_id.value(),
                price = %fill.price,
                quantity = %fill.quantity,
                remaining = %remaining,
                "matched against resting order"
            );
            fills.push(fill);
        }

        fills
    }

    fn top_price(&self, is_buy: bool) -> Option<Price> {
        if is_buy {
            self.bids.keys().next_back().copied()
        } else {
            self.asks.keys().next().copied()
        }
    }
}

/// Whether an opposite-side level at `level_price` is executable for the
/// aggressor. Market orders (no limit) cross every level.
fn crosses(aggressor_side: Side, level_price: Price, limit_price: Option<Price>) -> bool {
    match limit_price {
        None => true,
        Some(limit) => {
            if aggressor_side.is_buy() {
                level_price <= limit
            } else {
                level_price >= limit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::test_support::limit_order;
    use crate::domain::{OrderId, OrderStatus};

    fn tick() -> QuantityTick {
        QuantityTick::new(1.0)
    }

    #[test]
    fn aggressive_buy_fills_best_priced_sell_first() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.05, 50.0));
        book.insert(limit_order(2, Side::Sell, 10.00, 50.0));

        let fills =
            book.match_incoming(Side::Buy, Some(Price::new(10.05)), Quantity::new(60.0), tick());
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].resting.order_id, OrderId::new(2));
        assert_eq!(fills[0].price, Price::new(10.00));
        assert_eq!(fills[1].resting.order_id, OrderId::new(1));
        assert_eq!(fills[1].quantity, Quantity::new(10.0));
    }

    #[test]
    fn execution_price_is_the_resting_price() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 40.0));

        let fills =
            book.match_incoming(Side::Buy, Some(Price::new(10.50)), Quantity::new(40.0), tick());
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, Price::new(10.00));
    }

    #[test]
    fn same_level_fills_in_arrival_order() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 30.0));
        book.insert(limit_order(2, Side::Sell, 10.00, 30.0));

        let fills =
            book.match_incoming(Side::Buy, Some(Price::new(10.00)), Quantity::new(40.0), tick());
        assert_eq!(fills[0].resting.order_id, OrderId::new(1));
        assert!(fills[0].resting_fully_filled);
        assert_eq!(fills[1].resting.order_id, OrderId::new(2));
        assert!(!fills[1].resting_fully_filled);
        assert_eq!(fills[1].quantity, Quantity::new(10.0));
    }

    #[test]
    fn partially_filled_resting_order_stays_with_reduced_leaves() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 100.0));

        book.match_incoming(Side::Buy, Some(Price::new(10.00)), Quantity::new(40.0), tick());

        let resting = book.get(OrderId::new(1)).unwrap();
        assert_eq!(resting.order_status, OrderStatus::PartiallyFilled);
        assert_eq!(resting.leaves_quantity(), Quantity::new(60.0));
        assert_eq!(book.best(false), Some((Price::new(10.00), Quantity::new(60.0))));
    }

    #[test]
    fn non_crossing_limit_executes_nothing() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.05, 100.0));

        let fills =
            book.match_incoming(Side::Buy, Some(Price::new(10.00)), Quantity::new(40.0), tick());
        assert!(fills.is_empty());
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn market_order_sweeps_all_levels() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 30.0));
        book.insert(limit_order(2, Side::Sell, 11.00, 30.0));

        let fills = book.match_incoming(Side::Buy, None, Quantity::new(100.0), tick());
        assert_eq!(fills.len(), 2);
        assert!(book.is_empty());
    }

    #[test]
    fn fill_quantity_is_truncated_to_the_quantity_tick() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 100.0));

        let fills = book.match_incoming(
            Side::Buy,
            Some(Price::new(10.00)),
            Quantity::new(35.0),
            QuantityTick::new(10.0),
        );
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, Quantity::new(30.0));
    }

    #[test]
    fn short_sale_sides_match_as_sell() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 50.0));

        let fills = book.match_incoming(
            Side::SellShort,
            Some(Price::new(10.00)),
            Quantity::new(50.0),
            tick(),
        );
        assert_eq!(fills.len(), 1);
        assert!(book.is_empty());
    }

    #[test]
    fn crossable_quantity_respects_the_limit_price() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 50.0));
        book.insert(limit_order(2, Side::Sell, 10.05, 50.0));
        book.insert(limit_order(3, Side::Sell, 10.10, 50.0));

        assert_eq!(
            book.crossable_quantity(Side::Buy, Some(Price::new(10.05))),
            Quantity::new(100.0)
        );
        assert_eq!(book.crossable_quantity(Side::Buy, None), Quantity::new(150.0));
        assert_eq!(
            book.crossable_quantity(Side::Buy, Some(Price::new(9.00))),
            Quantity::ZERO
        );
    }
}
