//! The resting limit order record.

use crate::domain::{
    ClientOrderId, ExpireDate, ExpireTime, InstrumentDescriptor, OrderId, OrderStatus, OrderTime,
    Party, Price, Quantity, Session, ShortSaleExemptionReason, Side, TimeInForce,
};
use chrono::{DateTime, NaiveDate, Utc};

/// A limit order resting in (or about to enter) the book.
///
/// The engine is the only writer: orders mutate on modification requests and
/// partial fills, and leave the book when filled, cancelled or expired.
/// The original client descriptor and party list are preserved verbatim so
/// replies can echo what the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitOrder {
    pub order_id: OrderId,
    pub client_session: Session,
    pub client_order_id: Option<ClientOrderId>,
    pub orig_client_order_id: Option<ClientOrderId>,
    pub side: Side,
    pub time_in_force: TimeInForce,
    pub order_price: Price,
    pub total_quantity: Quantity,
    pub cum_executed_quantity: Quantity,
    pub order_status: OrderStatus,
    pub order_time: OrderTime,
    pub expire_time: Option<ExpireTime>,
    pub expire_date: Option<ExpireDate>,
    pub short_sale_exemption_reason: Option<ShortSaleExemptionReason>,
    pub client_instrument_descriptor: InstrumentDescriptor,
    pub order_parties: Vec<Party>,
}

impl LimitOrder {
    /// Quantity still open for execution.
    #[must_use]
    pub fn leaves_quantity(&self) -> Quantity {
        self.total_quantity.saturating_sub(self.cum_executed_quantity)
    }

    #[must_use]
    pub fn is_fully_executed(&self) -> bool {
        self.cum_executed_quantity >= self.total_quantity
    }

    /// Applies an execution, advancing the status towards `Filled`.
    pub(crate) fn apply_fill(&mut self, quantity: Quantity) {
        self.cum_executed_quantity = self.cum_executed_quantity.add(quantity);
        if self.is_fully_executed() {
            self.order_status = OrderStatus::Filled;
        } else if self.order_status == OrderStatus::New {
            self.order_status = OrderStatus::PartiallyFilled;
        }
    }

    /// Whether the order's lifetime has run out at the given instant.
    ///
    /// `Day` orders expire as soon as the local day moves past their
    /// acceptance day; `GoodTillDate` orders expire on `expire_time` (UTC)
    /// or at the end of `expire_date` (local day), whichever is configured.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, local_day: NaiveDate) -> bool {
        match self.time_in_force {
            TimeInForce::Day => crate::utils::local_day_of(self.order_time.value()) != local_day,
            TimeInForce::GoodTillDate => {
                if let Some(expire_time) = self.expire_time {
                    return expire_time.value() <= now;
                }
                if let Some(expire_date) = self.expire_date {
                    return expire_date.value() < local_day;
                }
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(time_in_force: TimeInForce) -> LimitOrder {
        LimitOrder {
            order_id: OrderId::new(1),
            client_session: Session::Generator,
            client_order_id: None,
            orig_client_order_id: None,
            side: Side::Buy,
            time_in_force,
            order_price: Price::new(10.0),
            total_quantity: Quantity::new(100.0),
            cum_executed_quantity: Quantity::ZERO,
            order_status: OrderStatus::New,
            order_time: OrderTime::new(Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap()),
            expire_time: None,
            expire_date: None,
            short_sale_exemption_reason: None,
            client_instrument_descriptor: InstrumentDescriptor::default(),
            order_parties: Vec::new(),
        }
    }

    #[test]
    fn fills_advance_status_then_terminate() {
        let mut order = order(TimeInForce::GoodTillCancel);
        order.apply_fill(Quantity::new(40.0));
        assert_eq!(order.order_status, OrderStatus::PartiallyFilled);
        assert_eq!(order.leaves_quantity(), Quantity::new(60.0));

        order.apply_fill(Quantity::new(60.0));
        assert_eq!(order.order_status, OrderStatus::Filled);
        assert!(order.is_fully_executed());
    }

    #[test]
    fn modified_status_is_not_downgraded_by_partial_fill() {
        let mut order = order(TimeInForce::GoodTillCancel);
        order.order_status = OrderStatus::Modified;
        order.apply_fill(Quantity::new(10.0));
        assert_eq!(order.order_status, OrderStatus::Modified);
    }

    #[test]
    fn day_order_expires_once_the_local_day_moves_on() {
        let order = order(TimeInForce::Day);
        let accepted_day = crate::utils::local_day_of(order.order_time.value());
        let now = order.order_time.value();
        assert!(!order.is_expired_at(now, accepted_day));
        assert!(order.is_expired_at(now, accepted_day + chrono::Duration::days(1)));
    }

    #[test]
    fn gtd_expire_time_is_inclusive() {
        let mut order = order(TimeInForce::GoodTillDate);
        let deadline = Utc.with_ymd_and_hms(2024, 5, 2, 17, 0, 0).unwrap();
        order.expire_time = Some(ExpireTime::new(deadline));
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(!order.is_expired_at(deadline - chrono::Duration::seconds(1), day));
        assert!(order.is_expired_at(deadline, day));
    }

    #[test]
    fn gtd_expire_date_expires_after_the_day() {
        let mut order = order(TimeInForce::GoodTillDate);
        order.expire_date = Some(ExpireDate::new(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()));
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        assert!(!order.is_expired_at(now, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()));
        assert!(order.is_expired_at(now, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
    }

    #[test]
    fn gtc_never_expires() {
        let order = order(TimeInForce::GoodTillCancel);
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(!order.is_expired_at(now, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }
}
