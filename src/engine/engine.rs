//! The per-instrument matching engine.
//!
//! Owns the order book, the market-data publisher and the security-status
//! tracker for one instrument, and turns every request into a batch of
//! client notifications. Failure is always a reject notification; the
//! engine never panics across its public boundary for client input (an
//! internal index inconsistency is a fatal bug and does abort).

use crate::book::{Fill, LimitOrder, OrderBook, OrderBookSide, OrderModification, Trade};
use crate::domain::{
    ClientOrderId, ExecutionId, Instrument, InstrumentDescriptor, MarketPhase, OrderId,
    OrderStatus, OrderTime, OrderType, Party, Price, Quantity, RejectText, Session, Side,
    TimeInForce, TradingPhase,
};
use crate::engine::events::{PhaseTransition, Tick};
use crate::engine::market_data::{MarketDataPublisher, MarketView};
use crate::engine::phase::SecurityStatusTracker;
use crate::engine::validation::{ClientRequestValidator, ValidatorConfig};
use crate::persistence::{InstrumentInfo, InstrumentState};
use crate::protocol::{
    ClientNotification, ExecutionReport, MarketDataRequest, OrderCancellationConfirmation,
    OrderCancellationReject, OrderCancellationRequest, OrderModificationConfirmation,
    OrderModificationReject, OrderModificationRequest, OrderPlacementConfirmation,
    OrderPlacementReject, OrderPlacementRequest, SecurityStatusRequest, SessionTerminatedEvent,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const REJECT_PHASE_PLACEMENT: &str = "order placement is not allowed in the current market phase";
const REJECT_PHASE_MODIFICATION: &str =
    "order modification is not allowed in the current market phase";
const REJECT_ORDER_NOT_FOUND: &str = "order is not found in the order book";
const REJECT_NO_EFFECT: &str = "order modification has no effect";
const REJECT_MARKET_MODIFICATION: &str = "order type is not supported";
const REASON_FOK_LIQUIDITY: &str = "insufficient liquidity for FOK";
const REASON_NO_LIQUIDITY: &str = "no liquidity";
const REASON_EXPIRED: &str = "expired";
const REASON_PHASE_CLOSED: &str = "trading phase closed";

/// What happens to a session's resting orders when the session goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Cancel everything that is not good-till-cancel.
    #[default]
    CancelNonPersistent,
    /// Cancel every resting order of the session.
    CancelAll,
    /// Leave the book untouched.
    KeepAll,
}

impl DisconnectPolicy {
    fn cancels(self, order: &LimitOrder) -> bool {
        match self {
            DisconnectPolicy::CancelNonPersistent => {
                order.time_in_force != TimeInForce::GoodTillCancel
            }
            DisconnectPolicy::CancelAll => true,
            DisconnectPolicy::KeepAll => false,
        }
    }
}

/// Engine behaviour knobs beyond the instrument constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub disconnect_policy: DisconnectPolicy,
}

/// Aggressor-side context threaded through the matching loop so that every
/// produced execution report carries the client's own identifiers.
struct AggressorView {
    order_id: OrderId,
    session: Session,
    instrument: InstrumentDescriptor,
    client_order_id: Option<ClientOrderId>,
    parties: Vec<Party>,
    side: Side,
    time_in_force: TimeInForce,
    total_quantity: Quantity,
    already_executed: Quantity,
}

/// The matching engine of a single instrument.
pub struct MatchingEngine {
    instrument: Instrument,
    validator: ClientRequestValidator,
    book: OrderBook,
    market_data: MarketDataPublisher,
    security_status: SecurityStatusTracker,
    phase: MarketPhase,
    next_order_id: u64,
    /// Per-order execution-id sequences; pruned when an order is destroyed.
    execution_sequences: HashMap<OrderId, u64>,
    last_trade: Option<Trade>,
    low_price: Option<Price>,
    high_price: Option<Price>,
    notifications: Vec<ClientNotification>,
    config: EngineConfig,
}

impl MatchingEngine {
    #[must_use]
    pub fn new(instrument: Instrument, config: EngineConfig) -> Self {
        let validator = ClientRequestValidator::new(ValidatorConfig {
            price_tick: instrument.price_tick,
            quantity_tick: instrument.quantity_tick,
            min_quantity: instrument.min_quantity,
            max_quantity: instrument.max_quantity,
        });
        let market_data = MarketDataPublisher::new(instrument.descriptor());
        Self {
            instrument,
            validator,
            book: OrderBook::new(),
            market_data,
            security_status: SecurityStatusTracker::new(),
            phase: MarketPhase::open(),
            next_order_id: 1,
            execution_sequences: HashMap::new(),
            last_trade: None,
            low_price: None,
            high_price: None,
            notifications: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    #[must_use]
    pub fn phase(&self) -> MarketPhase {
        self.phase
    }

    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Drains the notification batch produced by the commands executed so
    /// far; the queue worker hands the batch to the egress publisher.
    #[must_use]
    pub fn take_notifications(&mut self) -> Vec<ClientNotification> {
        std::mem::take(&mut self.notifications)
    }

    // ─── Order placement ────────────────────────────────────────────────

    pub fn execute_placement(&mut self, request: OrderPlacementRequest) {
        let now = crate::utils::now_micros();
        let today = crate::utils::local_day();

        if let Err(error) = self.validator.validate_placement(&request, now, today) {
            self.reject_placement(&request, error.reject_text());
            return;
        }
        if !self.phase.matching_allowed() {
            self.reject_placement(&request, REJECT_PHASE_PLACEMENT);
            return;
        }

        let side = request.side.expect("validated");
        let order_type = request.order_type.expect("validated");
        let quantity = request.quantity.expect("validated");
        let limit_price = request.order_price;
        let time_in_force = request.time_in_force.unwrap_or(TimeInForce::Day);
        let order_id = self.allocate_order_id();

        // Fill-or-kill is all-or-none: pre-check the crossable quantity so
        // the step never needs rolling back.
        if time_in_force == TimeInForce::FillOrKill
            && self.book.crossable_quantity(side, limit_price) < quantity
        {
            let execution_id = self.next_execution_id(order_id);
            self.execution_sequences.remove(&order_id);
            self.notifications.push(ClientNotification::Execution(ExecutionReport {
                session: request.session,
                instrument: request.instrument,
                client_order_id: request.client_order_id,
                parties: request.parties,
                venue_order_id: order_id,
                execution_id,
                order_status: OrderStatus::Cancelled,
                executed_price: None,
                executed_quantity: None,
                cum_executed_quantity: Quantity::ZERO,
                leaves_quantity: Quantity::ZERO,
                side,
                time_in_force: Some(time_in_force),
                reject_text: Some(RejectText::from(REASON_FOK_LIQUIDITY)),
            }));
            return;
        }

        let execution_id = self.next_execution_id(order_id);
        self.notifications.push(ClientNotification::PlacementConfirmation(
            OrderPlacementConfirmation {
                session: request.session.clone(),
                instrument: request.instrument.clone(),
                client_order_id: request.client_order_id.clone(),
                parties: request.parties.clone(),
                venue_order_id: order_id,
                execution_id,
                side,
                order_price: limit_price,
                order_quantity: quantity,
                time_in_force,
                expire_time: request.expire_time,
                expire_date: request.expire_date,
            },
        ));

        let aggressor = AggressorView {
            order_id,
            session: request.session.clone(),
            instrument: request.instrument.clone(),
            client_order_id: request.client_order_id.clone(),
            parties: request.parties.clone(),
            side,
            time_in_force,
            total_quantity: quantity,
            already_executed: Quantity::ZERO,
        };
        let executed = self.run_matching(&aggressor, limit_price, now);

        let leftover = quantity.saturating_sub(executed);
        if leftover.is_zero() {
            self.execution_sequences.remove(&order_id);
        } else if order_type == OrderType::Limit && time_in_force.may_rest() {
            let status =
                if executed.is_zero() { OrderStatus::New } else { OrderStatus::PartiallyFilled };
            self.book.insert(LimitOrder {
                order_id,
                client_session: request.session,
                client_order_id: request.client_order_id,
                orig_client_order_id: None,
                side,
                time_in_force,
                order_price: limit_price.expect("limit orders carry a price"),
                total_quantity: quantity,
                cum_executed_quantity: executed,
                order_status: status,
                order_time: OrderTime::new(now),
                expire_time: request.expire_time,
                expire_date: request.expire_date,
                short_sale_exemption_reason: request.short_sale_exemption_reason,
                client_instrument_descriptor: request.instrument,
                order_parties: request.parties,
            });
        } else {
            // IOC residual or a market order that ran out of liquidity.
            let execution_id = self.next_execution_id(order_id);
            self.execution_sequences.remove(&order_id);
            self.notifications.push(ClientNotification::Execution(ExecutionReport {
                session: request.session,
                instrument: request.instrument,
                client_order_id: request.client_order_id,
                parties: request.parties,
                venue_order_id: order_id,
                execution_id,
                order_status: OrderStatus::Cancelled,
                executed_price: None,
                executed_quantity: None,
                cum_executed_quantity: executed,
                leaves_quantity: Quantity::ZERO,
                side,
                time_in_force: Some(time_in_force),
                reject_text: Some(RejectText::from(REASON_NO_LIQUIDITY)),
            }));
        }

        self.publish_book_update();
    }

    // ─── Order modification ─────────────────────────────────────────────

    pub fn execute_modification(&mut self, request: OrderModificationRequest) {
        let now = crate::utils::now_micros();
        let today = crate::utils::local_day();

        if let Err(error) = self.validator.validate_modification(&request, now, today) {
            self.reject_modification(&request, error.reject_text());
            return;
        }
        if !self.phase.matching_allowed() {
            self.reject_modification(&request, REJECT_PHASE_MODIFICATION);
            return;
        }
        if request.order_type != Some(OrderType::Limit) {
            self.reject_modification(&request, REJECT_MARKET_MODIFICATION);
            return;
        }

        let Some(order_id) = self.locate(
            &request.session,
            request.venue_order_id,
            request.orig_client_order_id.as_ref(),
        ) else {
            self.reject_modification(&request, REJECT_ORDER_NOT_FOUND);
            return;
        };

        let new_quantity = request.quantity.expect("validated");
        let new_price = request.order_price.expect("validated");
        let current = self.book.get(order_id).expect("located above").clone();

        // Shrinking to (or below) the executed quantity closes the order:
        // the confirmation reports the clamped quantity, the follow-up
        // report terminates it as filled.
        if new_quantity <= current.cum_executed_quantity {
            let mut order = self.book.cancel(order_id).expect("located above");
            if let Some(new_client_order_id) = request.client_order_id.clone() {
                order.orig_client_order_id = order.client_order_id.take();
                order.client_order_id = Some(new_client_order_id);
            }
            order.total_quantity = order.cum_executed_quantity;
            order.order_status = OrderStatus::Modified;
            self.confirm_modification(&request, &order);

            let execution_id = self.next_execution_id(order_id);
            self.execution_sequences.remove(&order_id);
            self.notifications.push(ClientNotification::Execution(ExecutionReport {
                session: order.client_session.clone(),
                instrument: order.client_instrument_descriptor.clone(),
                client_order_id: order.client_order_id.clone(),
                parties: order.order_parties.clone(),
                venue_order_id: order_id,
                execution_id,
                order_status: OrderStatus::Filled,
                executed_price: None,
                executed_quantity: None,
                cum_executed_quantity: order.cum_executed_quantity,
                leaves_quantity: Quantity::ZERO,
                side: order.side,
                time_in_force: Some(order.time_in_force),
                reject_text: None,
            }));
            self.publish_book_update();
            return;
        }

        let modification = OrderModification {
            new_client_order_id: request.client_order_id.clone(),
            order_price: new_price,
            total_quantity: new_quantity,
            time_in_force: request.time_in_force.unwrap_or(current.time_in_force),
            expire_time: request.expire_time.or(current.expire_time),
            expire_date: request.expire_date.or(current.expire_date),
        };

        match self.book.modify(order_id, modification) {
            Ok(outcome) => {
                self.confirm_modification(&request, &outcome.order);
                if outcome.priority_reset {
                    self.rematch_after_modification(order_id, now);
                }
                self.publish_book_update();
            }
            Err(crate::book::BookError::NoEffect { .. }) => {
                self.reject_modification(&request, REJECT_NO_EFFECT);
            }
            Err(crate::book::BookError::OrderNotFound(_)) => {
                self.reject_modification(&request, REJECT_ORDER_NOT_FOUND);
            }
            Err(error) => unreachable!("modification pre-checks missed: {error}"),
        }
    }

    // ─── Order cancellation ─────────────────────────────────────────────

    pub fn execute_cancellation(&mut self, request: OrderCancellationRequest) {
        if let Err(error) = self.validator.validate_cancellation(&request) {
            self.reject_cancellation(&request, error.reject_text());
            return;
        }

        let Some(order_id) = self.locate(
            &request.session,
            request.venue_order_id,
            request.orig_client_order_id.as_ref(),
        ) else {
            self.reject_cancellation(&request, REJECT_ORDER_NOT_FOUND);
            return;
        };

        let order = self.book.cancel(order_id).expect("located above");
        let execution_id = self.next_execution_id(order_id);
        self.execution_sequences.remove(&order_id);
        self.notifications.push(ClientNotification::CancellationConfirmation(
            OrderCancellationConfirmation {
                session: request.session,
                instrument: order.client_instrument_descriptor.clone(),
                client_order_id: request.client_order_id.or(order.client_order_id.clone()),
                orig_client_order_id: request.orig_client_order_id,
                parties: order.order_parties.clone(),
                venue_order_id: order_id,
                execution_id,
                side: order.side,
                order_price: Some(order.order_price),
                leaves_quantity: Quantity::ZERO,
                cum_executed_quantity: order.cum_executed_quantity,
                order_status: OrderStatus::Cancelled,
            },
        ));
        self.publish_book_update();
    }

    // ─── Market data and security status ────────────────────────────────

    pub fn execute_market_data_request(&mut self, request: MarketDataRequest) {
        let view = MarketView {
            book: &self.book,
            phase: self.phase,
            last_trade: self.last_trade.as_ref(),
            low_price: self.low_price,
            high_price: self.high_price,
        };
        self.market_data.process(&request, view, &mut self.notifications);
    }

    pub fn execute_security_status_request(&mut self, request: SecurityStatusRequest) {
        self.security_status.process(&request, self.phase, &mut self.notifications);
    }

    /// Fills an instrument-state reply from the current top of book.
    pub fn provide_state(&self, reply: &mut crate::protocol::InstrumentState) {
        if let Some((price, depth)) = self.book.best(true) {
            reply.best_bid_price = Some(price);
            reply.current_bid_depth = Some(depth);
        }
        if let Some((price, depth)) = self.book.best(false) {
            reply.best_offer_price = Some(price);
            reply.current_offer_depth = Some(depth);
        }
    }

    // ─── State persistence ──────────────────────────────────────────────

    /// Captures the engine's state into the per-instrument snapshot record.
    pub fn store_state(&self, state: &mut InstrumentState) {
        state.instrument = self.instrument.clone();
        state.last_trade = self.last_trade.clone();
        state.info = InstrumentInfo { low_price: self.low_price, high_price: self.high_price };
        state.order_book.buy_orders = self.book.orders(true).cloned().collect();
        state.order_book.sell_orders = self.book.orders(false).cloned().collect();
    }

    /// Replaces the engine's book and last-trade from a persisted snapshot.
    ///
    /// Every order re-runs the recovered-order validation chain; invalid
    /// orders are dropped with a structured log entry and recovery
    /// continues.
    pub fn recover_state(&mut self, state: InstrumentState) {
        let now = crate::utils::now_micros();
        let today = crate::utils::local_day();

        self.last_trade = state.last_trade;
        self.low_price = state.info.low_price;
        self.high_price = state.info.high_price;

        let mut highest_order_id = self.next_order_id.saturating_sub(1);
        let sides = [
            (state.order_book.buy_orders, OrderBookSide::Buy),
            (state.order_book.sell_orders, OrderBookSide::Sell),
        ];
        for (orders, book_side) in sides {
            for order in orders {
                match self.validator.validate_recovered_order(&order, book_side, now, today) {
                    Ok(()) => {
                        highest_order_id = highest_order_id.max(order.order_id.value());
                        self.book.insert(order);
                    }
                    Err(error) => {
                        warn!(
                            instrument = %self.instrument.symbol,
                            order_id = order.order_id.value(),
                            %error,
                            "dropping invalid recovered order"
                        );
                    }
                }
            }
        }
        self.next_order_id = self.next_order_id.max(highest_order_id + 1);
        info!(
            instrument = %self.instrument.symbol,
            orders = self.book.order_count(),
            "recovered market state"
        );
    }

    // ─── Events ─────────────────────────────────────────────────────────

    /// Removes the session's subscriptions and cancels its resting orders
    /// per the configured disconnect policy. No notification is ever
    /// emitted towards the terminated session itself.
    pub fn handle_session_terminated(&mut self, event: &SessionTerminatedEvent) {
        let policy = self.config.disconnect_policy;
        let removed = self
            .book
            .remove_where(|order| order.client_session == event.session && policy.cancels(order));
        for order in &removed {
            self.execution_sequences.remove(&order.order_id);
        }
        self.market_data.drop_session(&event.session);
        self.security_status.drop_session(&event.session);
        info!(
            instrument = %self.instrument.symbol,
            session = %event.session,
            cancelled = removed.len(),
            "session terminated"
        );
        if !removed.is_empty() {
            self.publish_book_update();
        }
    }

    /// Expires Day and GTD orders whose deadline has passed.
    pub fn handle_tick(&mut self, tick: Tick) {
        let expired = self.book.remove_where(|order| order.is_expired_at(tick.now, tick.local_day));
        if expired.is_empty() {
            return;
        }
        for order in expired {
            debug!(order_id = order.order_id.value(), "order expired");
            self.emit_unsolicited_cancel(&order, REASON_EXPIRED);
        }
        self.publish_book_update();
    }

    /// Applies a phase transition, cancelling Day orders when the market
    /// closes and reporting the phase to security-status subscribers.
    pub fn handle_phase_transition(&mut self, transition: PhaseTransition) {
        if transition.phase == self.phase {
            return;
        }
        let entering_closed = transition.phase.trading_phase == TradingPhase::Closed
            && self.phase.trading_phase != TradingPhase::Closed;
        self.phase = transition.phase;
        info!(instrument = %self.instrument.symbol, phase = %self.phase, "phase transition");

        if entering_closed {
            let cancelled =
                self.book.remove_where(|order| order.time_in_force == TimeInForce::Day);
            for order in cancelled {
                self.emit_unsolicited_cancel(&order, REASON_PHASE_CLOSED);
            }
        }

        self.security_status.on_phase_changed(self.phase, &mut self.notifications);
        self.publish_book_update();
    }

    // ─── Internals ──────────────────────────────────────────────────────

    /// Runs the matching loop for an aggressor and emits the execution
    /// reports and market-data trades. Returns the newly executed quantity.
    fn run_matching(
        &mut self,
        aggressor: &AggressorView,
        limit_price: Option<Price>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Quantity {
        let quantity_tick = self.instrument.quantity_tick;
        let open_quantity =
            aggressor.total_quantity.saturating_sub(aggressor.already_executed);
        let fills =
            self.book.match_incoming(aggressor.side, limit_price, open_quantity, quantity_tick);

        let mut executed = Quantity::ZERO;
        let mut trades = Vec::with_capacity(fills.len());
        for fill in &fills {
            executed = executed.add(fill.quantity);
            self.emit_resting_report(fill);
            self.emit_aggressor_report(aggressor, fill, executed);

            let trade = self.build_trade(aggressor, fill, now);
            self.update_session_prices(fill.price);
            self.last_trade = Some(trade.clone());
            trades.push(trade);
        }

        for trade in &trades {
            self.market_data.on_trade(
                trade,
                self.low_price,
                self.high_price,
                self.phase,
                &mut self.notifications,
            );
        }
        executed
    }

    /// Re-runs matching for an order whose modification reset its priority
    /// and left it crossing the opposite side.
    fn rematch_after_modification(&mut self, order_id: OrderId, now: chrono::DateTime<chrono::Utc>) {
        let order = self.book.get(order_id).expect("modified order is resting").clone();
        if self
            .book
            .crossable_quantity(order.side, Some(order.order_price))
            .is_zero()
        {
            return;
        }

        let order = self.book.cancel(order_id).expect("modified order is resting");
        let aggressor = AggressorView {
            order_id,
            session: order.client_session.clone(),
            instrument: order.client_instrument_descriptor.clone(),
            client_order_id: order.client_order_id.clone(),
            parties: order.order_parties.clone(),
            side: order.side,
            time_in_force: order.time_in_force,
            total_quantity: order.total_quantity,
            already_executed: order.cum_executed_quantity,
        };
        let executed = self.run_matching(&aggressor, Some(order.order_price), now);

        let mut order = order;
        order.cum_executed_quantity = order.cum_executed_quantity.add(executed);
        if order.is_fully_executed() {
            self.execution_sequences.remove(&order_id);
        } else {
            self.book.insert(order);
        }
    }

    fn emit_resting_report(&mut self, fill: &Fill) {
        let resting = &fill.resting;
        let execution_id = self.next_execution_id(resting.order_id);
        if fill.resting_fully_filled {
            self.execution_sequences.remove(&resting.order_id);
        }
        self.notifications.push(ClientNotification::Execution(ExecutionReport {
            session: resting.client_session.clone(),
            instrument: resting.client_instrument_descriptor.clone(),
            client_order_id: resting.client_order_id.clone(),
            parties: resting.order_parties.clone(),
            venue_order_id: resting.order_id,
            execution_id,
            order_status: resting.order_status,
            executed_price: Some(fill.price),
            executed_quantity: Some(fill.quantity),
            cum_executed_quantity: resting.cum_executed_quantity,
            leaves_quantity: resting.leaves_quantity(),
            side: resting.side,
            time_in_force: Some(resting.time_in_force),
            reject_text: None,
        }));
    }

    fn emit_aggressor_report(&mut self, aggressor: &AggressorView, fill: &Fill, executed: Quantity) {
        let cum = aggressor.already_executed.add(executed);
        let leaves = aggressor.total_quantity.saturating_sub(cum);
        let status =
            if leaves.is_zero() { OrderStatus::Filled } else { OrderStatus::PartiallyFilled };
        let execution_id = self.next_execution_id(aggressor.order_id);
        self.notifications.push(ClientNotification::Execution(ExecutionReport {
            session: aggressor.session.clone(),
            instrument: aggressor.instrument.clone(),
            client_order_id: aggressor.client_order_id.clone(),
            parties: aggressor.parties.clone(),
            venue_order_id: aggressor.order_id,
            execution_id,
            order_status: status,
            executed_price: Some(fill.price),
            executed_quantity: Some(fill.quantity),
            cum_executed_quantity: cum,
            leaves_quantity: leaves,
            side: aggressor.side,
            time_in_force: Some(aggressor.time_in_force),
            reject_text: None,
        }));
    }

    fn build_trade(
        &self,
        aggressor: &AggressorView,
        fill: &Fill,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Trade {
        let aggressor_counterparty = counterparty(&aggressor.parties, &aggressor.session);
        let resting_counterparty =
            counterparty(&fill.resting.order_parties, &fill.resting.client_session);
        let (buyer, seller) = if aggressor.side.is_buy() {
            (aggressor_counterparty, resting_counterparty)
        } else {
            (resting_counterparty, aggressor_counterparty)
        };
        Trade {
            buyer,
            seller,
            price: fill.price,
            quantity: fill.quantity,
            aggressor_side: aggressor.side,
            time: now,
            phase: self.phase,
        }
    }

    fn emit_unsolicited_cancel(&mut self, order: &LimitOrder, reason: &str) {
        let execution_id = self.next_execution_id(order.order_id);
        self.execution_sequences.remove(&order.order_id);
        self.notifications.push(ClientNotification::Execution(ExecutionReport {
            session: order.client_session.clone(),
            instrument: order.client_instrument_descriptor.clone(),
            client_order_id: order.client_order_id.clone(),
            parties: order.order_parties.clone(),
            venue_order_id: order.order_id,
            execution_id,
            order_status: OrderStatus::Cancelled,
            executed_price: None,
            executed_quantity: None,
            cum_executed_quantity: order.cum_executed_quantity,
            leaves_quantity: Quantity::ZERO,
            side: order.side,
            time_in_force: Some(order.time_in_force),
            reject_text: Some(RejectText::from(reason)),
        }));
    }

    fn confirm_modification(&mut self, request: &OrderModificationRequest, order: &LimitOrder) {
        let execution_id = self.next_execution_id(order.order_id);
        self.notifications.push(ClientNotification::ModificationConfirmation(
            OrderModificationConfirmation {
                session: request.session.clone(),
                instrument: order.client_instrument_descriptor.clone(),
                client_order_id: order.client_order_id.clone(),
                orig_client_order_id: order.orig_client_order_id.clone(),
                parties: order.order_parties.clone(),
                venue_order_id: order.order_id,
                execution_id,
                side: order.side,
                order_price: order.order_price,
                order_quantity: order.total_quantity,
                cum_executed_quantity: order.cum_executed_quantity,
                leaves_quantity: order.leaves_quantity(),
                order_status: order.order_status,
                time_in_force: order.time_in_force,
            },
        ));
    }

    fn reject_placement(&mut self, request: &OrderPlacementRequest, text: &str) {
        let order_id = self.allocate_order_id();
        let execution_id = self.next_execution_id(order_id);
        self.execution_sequences.remove(&order_id);
        self.notifications.push(ClientNotification::PlacementReject(OrderPlacementReject {
            session: request.session.clone(),
            instrument: request.instrument.clone(),
            client_order_id: request.client_order_id.clone(),
            venue_order_id: order_id,
            execution_id,
            reject_text: RejectText::from(text),
            side: request.side,
            order_price: request.order_price,
            order_quantity: request.quantity,
            time_in_force: request.time_in_force,
        }));
    }

    fn reject_modification(&mut self, request: &OrderModificationRequest, text: &str) {
        self.notifications.push(ClientNotification::ModificationReject(OrderModificationReject {
            session: request.session.clone(),
            client_order_id: request.client_order_id.clone(),
            orig_client_order_id: request.orig_client_order_id.clone(),
            venue_order_id: request.venue_order_id,
            reject_text: RejectText::from(text),
            order_status: None,
        }));
    }

    fn reject_cancellation(&mut self, request: &OrderCancellationRequest, text: &str) {
        self.notifications.push(ClientNotification::CancellationReject(OrderCancellationReject {
            session: request.session.clone(),
            client_order_id: request.client_order_id.clone(),
            orig_client_order_id: request.orig_client_order_id.clone(),
            venue_order_id: request.venue_order_id,
            reject_text: RejectText::from(text),
            order_status: None,
        }));
    }

    fn publish_book_update(&mut self) {
        let view = MarketView {
            book: &self.book,
            phase: self.phase,
            last_trade: self.last_trade.as_ref(),
            low_price: self.low_price,
            high_price: self.high_price,
        };
        self.market_data.on_book_changed(view, &mut self.notifications);
    }

    fn locate(
        &self,
        session: &Session,
        venue_order_id: Option<OrderId>,
        orig_client_order_id: Option<&ClientOrderId>,
    ) -> Option<OrderId> {
        let order_id = match venue_order_id {
            Some(order_id) => order_id,
            None => self.book.find_by_client_order_id(session, orig_client_order_id?)?,
        };
        let order = self.book.get(order_id)?;
        (order.client_session == *session).then_some(order_id)
    }

    fn allocate_order_id(&mut self) -> OrderId {
        let order_id = OrderId::new(self.next_order_id);
        self.next_order_id += 1;
        order_id
    }

    fn next_execution_id(&mut self, order_id: OrderId) -> ExecutionId {
        let sequence = self.execution_sequences.entry(order_id).or_insert(0);
        *sequence += 1;
        ExecutionId::new(order_id, *sequence)
    }

    fn update_session_prices(&mut self, price: Price) {
        self.low_price = Some(match self.low_price {
            Some(low) if low <= price => low,
            _ => price,
        });
        self.high_price = Some(match self.high_price {
            Some(high) if high >= price => high,
            _ => price,
        });
    }
}

/// Counterparty identity recorded on trades: the order's first party id, or
/// the session identity when no party is attached.
fn counterparty(parties: &[Party], session: &Session) -> Option<String> {
    parties
        .first()
        .map(|party| party.party_id.value().to_string())
        .or_else(|| match session {
            Session::Fix(fix) => Some(fix.sender_comp_id.value().to_string()),
            Session::Generator => Some("generator".to_string()),
        })
}
