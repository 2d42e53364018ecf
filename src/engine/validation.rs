//! The fixed validation checker chain run before any engine state change.
//!
//! Checks run in a defined order and the first failure short-circuits; every
//! failure carries a canonical reject text that ends up verbatim in the
//! client-facing reject.

use crate::book::{LimitOrder, OrderBookSide};
use crate::domain::{
    MaxQuantity, MinQuantity, OrderStatus, OrderType, PriceTick, QuantityTick, TimeInForce,
};
use crate::protocol::{
    OrderCancellationRequest, OrderModificationRequest, OrderPlacementRequest,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use tracing::debug;

/// A violated validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    SideMissing,
    SideUnsupported,
    OrderTypeMissing,
    OrderTypeUnsupported,
    QuantityMissing,
    QuantityBelowMinimum,
    QuantityAboveMaximum,
    QuantityTickViolated,
    PriceMissing,
    PriceUnexpected,
    PriceTickViolated,
    TimeInForceUnsupported,
    ExpireInfoMissing,
    ExpireInfoConflicting,
    AlreadyExpired,
    // Recovered-order checks.
    WrongBookSide,
    OrderStatusUnsupported,
    CumExecutedNegative,
    CumExecutedTickViolated,
    CumExecutedNotBelowTotal,
}

impl ValidationError {
    /// The canonical client-facing reject text.
    #[must_use]
    pub const fn reject_text(self) -> &'static str {
        match self {
            ValidationError::SideMissing => "order side is missing",
            ValidationError::SideUnsupported => "order side is not supported",
            ValidationError::OrderTypeMissing => "order type is missing",
            ValidationError::OrderTypeUnsupported => "order type is not supported",
            ValidationError::QuantityMissing => "order quantity is missing",
            ValidationError::QuantityBelowMinimum => {
                "order quantity is less than the minimal allowed quantity"
            }
            ValidationError::QuantityAboveMaximum => {
                "order quantity is greater than the maximal allowed quantity"
            }
            ValidationError::QuantityTickViolated => {
                "order quantity is not a multiple of the quantity tick"
            }
            ValidationError::PriceMissing => "order price is missing",
            ValidationError::PriceUnexpected => "order price is not allowed for a market order",
            ValidationError::PriceTickViolated => {
                "order price is not a multiple of the price tick"
            }
            ValidationError::TimeInForceUnsupported => "time in force is not supported",
            ValidationError::ExpireInfoMissing => {
                "expire time or expire date is required for a good till date order"
            }
            ValidationError::ExpireInfoConflicting => {
                "expire time and expire date are mutually exclusive"
            }
            ValidationError::AlreadyExpired => "order has already expired",
            ValidationError::WrongBookSide => "order side does not match the order book side",
            ValidationError::OrderStatusUnsupported => "order status is not supported",
            ValidationError::CumExecutedNegative => "cumulative executed quantity is negative",
            ValidationError::CumExecutedTickViolated => {
                "cumulative executed quantity is not a multiple of the quantity tick"
            }
            ValidationError::CumExecutedNotBelowTotal => {
                "cumulative executed quantity is not less than the total quantity"
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reject_text())
    }
}

impl std::error::Error for ValidationError {}

/// Per-instrument validation constraints.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorConfig {
    pub price_tick: PriceTick,
    pub quantity_tick: QuantityTick,
    pub min_quantity: MinQuantity,
    pub max_quantity: MaxQuantity,
}

/// Validates client requests against the instrument's constraints.
#[derive(Debug, Clone, Copy)]
pub struct ClientRequestValidator {
    config: ValidatorConfig,
}

impl ClientRequestValidator {
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate_placement(
        &self,
        request: &OrderPlacementRequest,
        now: DateTime<Utc>,
        local_day: NaiveDate,
    ) -> Result<(), ValidationError> {
        let result = self.run_order_checks(
            request.side.is_some(),
            request.order_type,
            request.quantity.map(crate::domain::Quantity::value),
            request.order_price.is_some(),
            request.order_price,
            request.time_in_force,
            request.expire_time,
            request.expire_date,
            now,
            local_day,
        );
        if let Err(error) = result {
            debug!(%error, "order placement request failed validation");
        }
        result
    }

    pub fn validate_modification(
        &self,
        request: &OrderModificationRequest,
        now: DateTime<Utc>,
        local_day: NaiveDate,
    ) -> Result<(), ValidationError> {
        let result = self.run_order_checks(
            request.side.is_some(),
            request.order_type,
            request.quantity.map(crate::domain::Quantity::value),
            request.order_price.is_some(),
            request.order_price,
            request.time_in_force,
            request.expire_time,
            request.expire_date,
            now,
            local_day,
        );
        if let Err(error) = result {
            debug!(%error, "order modification request failed validation");
        }
        result
    }

    pub fn validate_cancellation(
        &self,
        request: &OrderCancellationRequest,
    ) -> Result<(), ValidationError> {
        if request.side.is_none() {
            debug!("order cancellation request failed validation: side is missing");
            return Err(ValidationError::SideMissing);
        }
        Ok(())
    }

    /// Validates a limit order recovered from a persisted snapshot.
    pub fn validate_recovered_order(
        &self,
        order: &LimitOrder,
        book_side: OrderBookSide,
        now: DateTime<Utc>,
        local_day: NaiveDate,
    ) -> Result<(), ValidationError> {
        if !book_side.accepts(order.side) {
            return Err(ValidationError::WrongBookSide);
        }
        let total = order.total_quantity;
        if total < crate::domain::Quantity::new(self.config.min_quantity.value()) {
            return Err(ValidationError::QuantityBelowMinimum);
        }
        if total > crate::domain::Quantity::new(self.config.max_quantity.value()) {
            return Err(ValidationError::QuantityAboveMaximum);
        }
        if !total.respects_tick(self.config.quantity_tick) {
            return Err(ValidationError::QuantityTickViolated);
        }
        if order.cum_executed_quantity < crate::domain::Quantity::ZERO {
            return Err(ValidationError::CumExecutedNegative);
        }
        if !order.cum_executed_quantity.respects_tick(self.config.quantity_tick) {
            return Err(ValidationError::CumExecutedTickViolated);
        }
        if order.cum_executed_quantity >= total {
            return Err(ValidationError::CumExecutedNotBelowTotal);
        }
        if !order.order_price.respects_tick(self.config.price_tick) {
            return Err(ValidationError::PriceTickViolated);
        }
        if !matches!(
            order.order_status,
            OrderStatus::New | OrderStatus::PartiallyFilled | OrderStatus::Modified
        ) {
            return Err(ValidationError::OrderStatusUnsupported);
        }
        if !order.time_in_force.may_rest() {
            return Err(ValidationError::TimeInForceUnsupported);
        }
        if order.expire_time.is_some() && order.expire_date.is_some() {
            return Err(ValidationError::ExpireInfoConflicting);
        }
        match order.time_in_force {
            TimeInForce::Day if order.is_expired_at(now, local_day) => {
                Err(ValidationError::AlreadyExpired)
            }
            TimeInForce::GoodTillDate => {
                if order.expire_time.is_none() && order.expire_date.is_none() {
                    return Err(ValidationError::ExpireInfoMissing);
                }
                if order.is_expired_at(now, local_day) {
                    return Err(ValidationError::AlreadyExpired);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_order_checks(
        &self,
        side_present: bool,
        order_type: Option<OrderType>,
        quantity: Option<f64>,
        price_present: bool,
        price: Option<crate::domain::Price>,
        time_in_force: Option<TimeInForce>,
        expire_time: Option<crate::domain::ExpireTime>,
        expire_date: Option<crate::domain::ExpireDate>,
        now: DateTime<Utc>,
        local_day: NaiveDate,
    ) -> Result<(), ValidationError> {
        if !side_present {
            return Err(ValidationError::SideMissing);
        }
        let Some(order_type) = order_type else {
            return Err(ValidationError::OrderTypeMissing);
        };
        let Some(quantity) = quantity else {
            return Err(ValidationError::QuantityMissing);
        };
        if quantity < self.config.min_quantity.value() {
            return Err(ValidationError::QuantityBelowMinimum);
        }
        if quantity > self.config.max_quantity.value() {
            return Err(ValidationError::QuantityAboveMaximum);
        }
        if !crate::domain::Quantity::new(quantity).respects_tick(self.config.quantity_tick) {
            return Err(ValidationError::QuantityTickViolated);
        }
        match order_type {
            OrderType::Limit => {
                if !price_present {
                    return Err(ValidationError::PriceMissing);
                }
                let price = price.expect("presence checked above");
                if !price.respects_tick(self.config.price_tick) {
                    return Err(ValidationError::PriceTickViolated);
                }
            }
            OrderType::Market => {
                if price_present {
                    return Err(ValidationError::PriceUnexpected);
                }
            }
        }
        if expire_time.is_some() && expire_date.is_some() {
            return Err(ValidationError::ExpireInfoConflicting);
        }
        if time_in_force == Some(TimeInForce::GoodTillDate) {
            if expire_time.is_none() && expire_date.is_none() {
                return Err(ValidationError::ExpireInfoMissing);
            }
            let expired = expire_time.is_some_and(|t| t.value() <= now)
                || expire_date.is_some_and(|d| d.value() < local_day);
            if expired {
                return Err(ValidationError::AlreadyExpired);
            }
        }
        Ok(())
    }
}
