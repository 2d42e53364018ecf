//! Order construction helpers shared by the book unit tests.

use crate::book::order::LimitOrder;
use crate::domain::{
    ClientOrderId, InstrumentDescriptor, OrderId, OrderStatus, OrderTime, Price, Quantity,
    Session, Side, TimeInForce,
};

pub(crate) fn limit_order(id: u64, side: Side, price: f64, quantity: f64) -> LimitOrder {
    limit_order_for_session(
        id,
        &Session::fix("FIX.4.4", "TESTER", "VENUE"),
        &format!("clord-{id}"),
        side,
        price,
        quantity,
    )
}

pub(crate) fn limit_order_for_session(
    id: u64,
    session: &Session,
    client_order_id: &str,
    side: Side,
    price: f64,
    quantity: f64,
) -> LimitOrder {
    LimitOrder {
        order_id: OrderId::new(id),
        client_session: session.clone(),
        client_order_id: Some(ClientOrderId::from(client_order_id)),
        orig_client_order_id: None,
        side,
        time_in_force: TimeInForce::GoodTillCancel,
        order_price: Price::new(price),
        total_quantity: Quantity::new(quantity),
        cum_executed_quantity: Quantity::ZERO,
        order_status: OrderStatus::New,
        order_time: OrderTime::new(crate::utils::now_micros()),
        expire_time: None,
        expire_date: None,
        short_sale_exemption_reason: None,
        client_instrument_descriptor: InstrumentDescriptor::default(),
        order_parties: Vec::new(),
    }
}
