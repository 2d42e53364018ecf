//! Shared fixtures for the integration tests.

use venue_core_rs::domain::{
    Currency, Instrument, InstrumentDescriptor, InstrumentId, MaxQuantity, MinQuantity, OrderType,
    Price, PriceTick, Quantity, QuantityTick, SecurityExchange, SecurityId, SecurityIdentifiers,
    SecurityType, Session, Side, Symbol, TimeInForce,
};
use venue_core_rs::protocol::OrderPlacementRequest;

/// Installs a warn-level subscriber once so failing tests show engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

pub fn instrument(id: u32, symbol: &str, isin: Option<&str>) -> Instrument {
    Instrument {
        instrument_id: InstrumentId::new(id),
        symbol: Symbol::from(symbol),
        security_type: SecurityType::CommonStock,
        price_currency: Currency::from("USD"),
        base_currency: Currency::from("USD"),
        security_exchange: SecurityExchange::from("XSIM"),
        identifiers: SecurityIdentifiers {
            isin: isin.map(SecurityId::from),
            ..SecurityIdentifiers::default()
        },
        party_id: None,
        party_role: None,
        price_tick: PriceTick::new(0.01),
        quantity_tick: QuantityTick::new(1.0),
        min_quantity: MinQuantity::new(1.0),
        max_quantity: MaxQuantity::new(1_000_000.0),
    }
}

pub fn session(name: &str) -> Session {
    Session::fix("FIX.4.4", name, "VENUE")
}

#[allow(clippy::too_many_arguments)]
pub fn placement(
    owner: &str,
    symbol: &str,
    client_order_id: &str,
    side: Side,
    quantity: f64,
    price: f64,
    time_in_force: TimeInForce,
) -> OrderPlacementRequest {
    let mut request =
        OrderPlacementRequest::new(session(owner), InstrumentDescriptor::for_symbol(symbol));
    request.client_order_id = Some(client_order_id.into());
    request.side = Some(side);
    request.order_type = Some(OrderType::Limit);
    request.order_price = Some(Price::new(price));
    request.quantity = Some(Quantity::new(quantity));
    request.time_in_force = Some(time_in_force);
    request
}
