//! The per-instrument order book: two price-ordered sides with FIFO levels.

use crate::book::error::BookError;
use crate::book::order::LimitOrder;
use crate::domain::{
    ClientOrderId, ExpireDate, ExpireTime, OrderId, OrderStatus, Price, Quantity, Session, Side,
    TimeInForce,
};
use either::Either;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::trace;

/// One price level: resting orders in arrival order.
type PriceLevelQueue = VecDeque<LimitOrder>;

/// The fields a modification request may change on a resting order.
#[derive(Debug, Clone)]
pub struct OrderModification {
    pub new_client_order_id: Option<ClientOrderId>,
    pub order_price: Price,
    pub total_quantity: Quantity,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<ExpireTime>,
    pub expire_date: Option<ExpireDate>,
}

/// Result of a successful modification.
#[derive(Debug, Clone)]
pub struct ModifyOutcome {
    /// The order state after the modification was applied.
    pub order: LimitOrder,
    /// Whether the order lost its time priority (price change or quantity
    /// increase moves it to the tail of its price level).
    pub priority_reset: bool,
}

/// A price-time-priority order book for one instrument.
///
/// The buy side is ordered by price descending, the sell side ascending;
/// within a level orders queue in arrival order. The book is exclusively
/// owned by its engine's queue worker, so all operations take `&mut self`
/// and no internal synchronisation exists.
#[derive(Debug, Default)]
pub struct OrderBook {
    pub(super) bids: BTreeMap<Price, PriceLevelQueue>,
    pub(super) asks: BTreeMap<Price, PriceLevelQueue>,
    /// Order id -> (is buy side, price level) for O(log n) location.
    pub(super) locations: HashMap<OrderId, (bool, Price)>,
    /// (session, client order id) -> order id, for modification and
    /// cancellation requests that target by client identifier.
    pub(super) client_index: HashMap<(Session, ClientOrderId), OrderId>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resting orders on both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Places a validated limit order at the tail of its price level.
    ///
    /// The level is created if absent. The caller is responsible for running
    /// the matching loop first; the book itself never matches on insert.
    pub fn insert(&mut self, order: LimitOrder) {
        trace!(
            order_id = order.order_id.value(),
            side = %order.side,
            price = %order.order_price,
            leaves = %order.leaves_quantity(),
            "inserting resting order"
        );
        self.index_client_id(&order);
        self.locations.insert(order.order_id, (order.side.is_buy(), order.order_price));
        self.side_mut(order.side.is_buy())
            .entry(order.order_price)
            .or_default()
            .push_back(order);
    }

    /// Removes an order, returning its last state.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<LimitOrder, BookError> {
        let (is_buy, price) =
            self.locations.remove(&order_id).ok_or(BookError::OrderNotFound(order_id))?;
        let order = Self::take_from_level(self.side_mut(is_buy), price, order_id)
            .expect("order location points at a level not holding the order");
        self.unindex_client_id(&order);
        trace!(order_id = order_id.value(), "removed resting order");
        Ok(order)
    }

    /// Applies a modification to a resting order.
    ///
    /// A price change or a total-quantity increase moves the order to the
    /// tail of its (possibly new) price level; a pure decrease keeps its
    /// queue position. Either way the status becomes `Modified`.
    pub fn modify(
        &mut self,
        order_id: OrderId,
        modification: OrderModification,
    ) -> Result<ModifyOutcome, BookError> {
        let (is_buy, price) =
            *self.locations.get(&order_id).ok_or(BookError::OrderNotFound(order_id))?;

        let (position, price_changed, quantity_increased) = {
            let level = self
                .side(is_buy)
                .get(&price)
                .expect("order location points at a missing price level");
            let position = level
                .iter()
                .position(|order| order.order_id == order_id)
                .expect("order location points at a level not holding the order");
            let current = &level[position];

            if modification.total_quantity <= current.cum_executed_quantity {
                return Err(BookError::UnderflowExecuted {
                    order_id,
                    requested_quantity: modification.total_quantity,
                    executed_quantity: current.cum_executed_quantity,
                });
            }

            let price_changed = modification.order_price != current.order_price;
            let changed = price_changed
                || modification.total_quantity != current.total_quantity
                || modification.new_client_order_id.is_some()
                || modification.time_in_force != current.time_in_force
                || modification.expire_time != current.expire_time
                || modification.expire_date != current.expire_date;
            if !changed {
                return Err(BookError::NoEffect { order_id });
            }

            (position, price_changed, modification.total_quantity > current.total_quantity)
        };

        let priority_reset = price_changed || quantity_increased;
        let mut order = {
            let side = self.side_mut(is_buy);
            let level = side.get_mut(&price).expect("level located above");
            let order = level.remove(position).expect("position located above");
            if level.is_empty() {
                side.remove(&price);
            }
            order
        };

        self.unindex_client_id(&order);
        if let Some(new_id) = modification.new_client_order_id {
            order.orig_client_order_id = order.client_order_id.take();
            order.client_order_id = Some(new_id);
        }
        order.order_price = modification.order_price;
        order.total_quantity = modification.total_quantity;
        order.time_in_force = modification.time_in_force;
        order.expire_time = modification.expire_time;
        order.expire_date = modification.expire_date;
        order.order_status = OrderStatus::Modified;
        self.index_client_id(&order);

        let snapshot = order.clone();
        self.locations.insert(order_id, (is_buy, order.order_price));
        let target = self.side_mut(is_buy).entry(order.order_price).or_default();
        if priority_reset {
            target.push_back(order);
        } else {
            // Same price level, same queue position.
            target.insert(position, order);
        }

        trace!(
            order_id = order_id.value(),
            priority_reset,
            price = %snapshot.order_price,
            total_quantity = %snapshot.total_quantity,
            "modified resting order"
        );
        Ok(ModifyOutcome { order: snapshot, priority_reset })
    }

    /// Immutable access to a resting order.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&LimitOrder> {
        let (is_buy, price) = *self.locations.get(&order_id)?;
        self.side(is_buy)
            .get(&price)?
            .iter()
            .find(|order| order.order_id == order_id)
    }

    /// Looks an order up by the client identifier it currently carries.
    #[must_use]
    pub fn find_by_client_order_id(
        &self,
        session: &Session,
        client_order_id: &ClientOrderId,
    ) -> Option<OrderId> {
        self.client_index.get(&(session.clone(), client_order_id.clone())).copied()
    }

    /// Price and aggregated open quantity of the top level of a side.
    #[must_use]
    pub fn best(&self, is_buy: bool) -> Option<(Price, Quantity)> {
        let (price, level) = if is_buy {
            self.bids.iter().next_back()?
        } else {
            self.asks.iter().next()?
        };
        Some((*price, Self::level_quantity(level)))
    }

    /// Visits price levels in book order (buy descending, sell ascending),
    /// yielding the aggregated open quantity per level.
    pub fn levels(&self, is_buy: bool) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        self.side_iter(is_buy)
            .map(|(price, level)| (*price, Self::level_quantity(level)))
    }

    /// Orders of one side in book order, heads of levels first.
    pub fn orders(&self, is_buy: bool) -> impl Iterator<Item = &LimitOrder> + '_ {
        self.side_iter(is_buy).flat_map(|(_, level)| level.iter())
    }

    /// Removes every order matching the predicate, preserving book order of
    /// the removed set.
    pub fn remove_where<P>(&mut self, mut predicate: P) -> Vec<LimitOrder>
    where
        P: FnMut(&LimitOrder) -> bool,
    {
        let mut removed = Vec::new();
        for is_buy in [true, false] {
            let side = self.side_mut(is_buy);
            let mut empty_levels = Vec::new();
            for (price, level) in side.iter_mut() {
                let mut index = 0;
                while index < level.len() {
                    if predicate(&level[index]) {
                        if let Some(order) = level.remove(index) {
                            removed.push(order);
                        }
                    } else {
                        index += 1;
                    }
                }
                if level.is_empty() {
                    empty_levels.push(*price);
                }
            }
            for price in empty_levels {
                side.remove(&price);
            }
        }
        for order in &removed {
            self.locations.remove(&order.order_id);
            self.unindex_client_id(order);
        }
        removed
    }

    pub(crate) fn side(&self, is_buy: bool) -> &BTreeMap<Price, PriceLevelQueue> {
        if is_buy { &self.bids } else { &self.asks }
    }

    pub(crate) fn side_mut(&mut self, is_buy: bool) -> &mut BTreeMap<Price, PriceLevelQueue> {
        if is_buy { &mut self.bids } else { &mut self.asks }
    }

    /// Iterates one side in book order. The buy side walks the ordered map
    /// backwards so the best (highest) price comes first.
    pub(crate) fn side_iter(
        &self,
        is_buy: bool,
    ) -> impl Iterator<Item = (&Price, &PriceLevelQueue)> + '_ {
        if is_buy {
            Either::Left(self.bids.iter().rev())
        } else {
            Either::Right(self.asks.iter())
        }
    }

    pub(crate) fn level_quantity(level: &PriceLevelQueue) -> Quantity {
        level
            .iter()
            .fold(Quantity::ZERO, |total, order| total.add(order.leaves_quantity()))
    }

    fn take_from_level(
        side: &mut BTreeMap<Price, PriceLevelQueue>,
        price: Price,
        order_id: OrderId,
    ) -> Option<LimitOrder> {
        let level = side.get_mut(&price)?;
        let position = level.iter().position(|order| order.order_id == order_id)?;
        let order = level.remove(position);
        if level.is_empty() {
            side.remove(&price);
        }
        order
    }

    pub(super) fn index_client_id(&mut self, order: &LimitOrder) {
        if let Some(client_order_id) = &order.client_order_id {
            self.client_index
                .insert((order.client_session.clone(), client_order_id.clone()), order.order_id);
        }
    }

    pub(super) fn unindex_client_id(&mut self, order: &LimitOrder) {
        if let Some(client_order_id) = &order.client_order_id {
            self.client_index.remove(&(order.client_session.clone(), client_order_id.clone()));
        }
    }
}

/// The side of the book an order rests on, as used by recovered-state
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookSide {
    Buy,
    Sell,
}

impl OrderBookSide {
    /// Whether an order side may rest on this book side.
    #[must_use]
    pub fn accepts(self, side: Side) -> bool {
        match self {
            OrderBookSide::Buy => side.is_buy(),
            OrderBookSide::Sell => !side.is_buy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::test_support::{limit_order, limit_order_for_session};
    use crate::domain::Session;

    #[test]
    fn buy_levels_iterate_price_descending() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        book.insert(limit_order(2, Side::Buy, 10.02, 50.0));
        book.insert(limit_order(3, Side::Buy, 9.98, 70.0));

        let prices: Vec<Price> = book.levels(true).map(|(price, _)| price).collect();
        assert_eq!(prices, vec![Price::new(10.02), Price::new(10.00), Price::new(9.98)]);
    }

    #[test]
    fn sell_levels_iterate_price_ascending() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 100.0));
        book.insert(limit_order(2, Side::Sell, 10.02, 50.0));

        let prices: Vec<Price> = book.levels(false).map(|(price, _)| price).collect();
        assert_eq!(prices, vec![Price::new(10.00), Price::new(10.02)]);
    }

    #[test]
    fn best_aggregates_open_quantity_at_the_top_level() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        book.insert(limit_order(2, Side::Buy, 10.00, 40.0));
        book.insert(limit_order(3, Side::Buy, 9.99, 500.0));

        let (price, quantity) = book.best(true).unwrap();
        assert_eq!(price, Price::new(10.00));
        assert_eq!(quantity, Quantity::new(140.0));
    }

    #[test]
    fn cancel_removes_the_order_and_collapses_the_level() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Sell, 10.00, 100.0));
        let cancelled = book.cancel(OrderId::new(1)).unwrap();
        assert_eq!(cancelled.order_id, OrderId::new(1));
        assert!(book.is_empty());
        assert!(book.best(false).is_none());
    }

    #[test]
    fn cancel_unknown_order_is_not_found() {
        let mut book = OrderBook::new();
        assert_eq!(book.cancel(OrderId::new(9)), Err(BookError::OrderNotFound(OrderId::new(9))));
    }

    #[test]
    fn price_change_moves_order_to_tail_of_new_level() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        book.insert(limit_order(2, Side::Buy, 10.00, 50.0));

        let outcome = book
            .modify(OrderId::new(1), modification(9.99, 100.0))
            .unwrap();
        assert!(outcome.priority_reset);
        assert_eq!(outcome.order.order_status, OrderStatus::Modified);

        // Move it back: it must now queue behind order 2.
        book.modify(OrderId::new(1), modification(10.00, 100.0)).unwrap();
        let ids: Vec<OrderId> = book.orders(true).map(|order| order.order_id).collect();
        assert_eq!(ids, vec![OrderId::new(2), OrderId::new(1)]);
    }

    #[test]
    fn quantity_decrease_keeps_queue_position() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        book.insert(limit_order(2, Side::Buy, 10.00, 50.0));

        let outcome = book
            .modify(OrderId::new(1), modification(10.00, 60.0))
            .unwrap();
        assert!(!outcome.priority_reset);

        let ids: Vec<OrderId> = book.orders(true).map(|order| order.order_id).collect();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2)]);
    }

    #[test]
    fn quantity_increase_resets_priority() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        book.insert(limit_order(2, Side::Buy, 10.00, 50.0));

        let outcome = book
            .modify(OrderId::new(1), modification(10.00, 150.0))
            .unwrap();
        assert!(outcome.priority_reset);

        let ids: Vec<OrderId> = book.orders(true).map(|order| order.order_id).collect();
        assert_eq!(ids, vec![OrderId::new(2), OrderId::new(1)]);
    }

    #[test]
    fn modification_without_changes_is_no_effect() {
        let mut book = OrderBook::new();
        book.insert(limit_order(1, Side::Buy, 10.00, 100.0));
        let error = book.modify(OrderId::new(1), modification(10.00, 100.0)).unwrap_err();
        assert_eq!(error, BookError::NoEffect { order_id: OrderId::new(1) });
    }

    #[test]
    fn modification_below_executed_quantity_underflows() {
        let mut book = OrderBook::new();
        let mut order = limit_order(1, Side::Buy, 10.00, 100.0);
        order.apply_fill(Quantity::new(40.0));
        book.insert(order);

        let error = book.modify(OrderId::new(1), modification(10.00, 40.0)).unwrap_err();
        assert!(matches!(error, BookError::UnderflowExecuted { .. }));
    }

    #[test]
    fn client_index_follows_client_order_id_replacement() {
        let session = Session::fix("FIX.4.4", "CLIENT1", "VENUE");
        let mut book = OrderBook::new();
        book.insert(limit_order_for_session(1, &session, "A", Side::Buy, 10.00, 100.0));
        assert_eq!(
            book.find_by_client_order_id(&session, &ClientOrderId::from("A")),
            Some(OrderId::new(1))
        );

        let mut change = modification(10.00, 80.0);
        change.new_client_order_id = Some(ClientOrderId::from("B"));
        book.modify(OrderId::new(1), change).unwrap();

        assert_eq!(book.find_by_client_order_id(&session, &ClientOrderId::from("A")), None);
        assert_eq!(
            book.find_by_client_order_id(&session, &ClientOrderId::from("B")),
            Some(OrderId::new(1))
        );
        let order = book.get(OrderId::new(1)).unwrap();
        assert_eq!(order.orig_client_order_id, Some(ClientOrderId::from("A")));
    }

    #[test]
    fn remove_where_strips_matching_orders_from_both_sides() {
        let session = Session::fix("FIX.4.4", "CLIENT1", "VENUE");
        let other = Session::fix("FIX.4.4", "CLIENT2", "VENUE");
        let mut book = OrderBook::new();
        book.insert(limit_order_for_session(1, &session, "A", Side::Buy, 10.00, 100.0));
        book.insert(limit_order_for_session(2, &other, "B", Side::Buy, 10.00, 100.0));
        book.insert(limit_order_for_session(3, &session, "C", Side::Sell, 10.10, 100.0));

        let removed = book.remove_where(|order| order.client_session == session);
        let removed_ids: Vec<OrderId> = removed.iter().map(|order| order.order_id).collect();
        assert_eq!(removed_ids, vec![OrderId::new(1), OrderId::new(3)]);
        assert_eq!(book.order_count(), 1);
        assert!(book.get(OrderId::new(2)).is_some());
    }

    fn modification(price: f64, quantity: f64) -> OrderModification {
        OrderModification {
            new_client_order_id: None,
            order_price: Price::new(price),
            total_quantity: Quantity::new(quantity),
            time_in_force: TimeInForce::GoodTillCancel,
            expire_time: None,
            expire_date: None,
        }
    }
}
