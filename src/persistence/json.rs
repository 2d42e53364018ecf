//! Manual JSON mapping for the persisted market state.
//!
//! The persisted format is strict: unknown fields are rejected, missing
//! required fields fail with a path-qualified error
//! (`failed to parse field 'X': ...`), timestamps use microsecond-precision
//! `YYYY-MM-DD HH:MM:SS.ffffff` strings and enums their canonical string
//! form. Hand-rolled mapping keeps full control over both directions.

use crate::book::{LimitOrder, Trade};
use crate::domain::{
    ClientOrderId, Currency, ExpireDate, ExpireTime, FixSession, Instrument,
    InstrumentDescriptor, InstrumentId, MarketPhase, MaxQuantity, MinQuantity, OrderId,
    OrderStatus, OrderTime, Party, PartyId, PartyIdSource, PartyRole, Price, PriceTick, Quantity,
    QuantityTick, SecurityExchange, SecurityId, SecurityIdSource, SecurityIdentifiers,
    SecurityType, Session, ShortSaleExemptionReason, Side, Symbol, TimeInForce, TradingPhase,
    TradingStatus,
};
use crate::persistence::serializer::SerializerError;
use crate::persistence::state::{InstrumentInfo, InstrumentState, OrderBookState, Snapshot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};
use std::str::FromStr;

type JsonResult<T> = Result<T, SerializerError>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
/// Accepts any fractional precision on read; writes always carry six digits.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn field_error(path: &str, message: impl std::fmt::Display) -> SerializerError {
    SerializerError::new(format!("failed to parse field '{path}': {message}"))
}

/// Strict object reader: rejects unknown fields, resolves values by name
/// and reports errors with the full field path.
struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> ObjectReader<'a> {
    fn new(value: &'a Value, path: &str, known_fields: &[&str]) -> JsonResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| field_error(path, "expected a JSON object"))?;
        for key in map.keys() {
            if !known_fields.contains(&key.as_str()) {
                return Err(field_error(&format!("{path}.{key}"), "unknown field"));
            }
        }
        Ok(Self { map, path: path.to_string() })
    }

    fn child_path(&self, name: &str) -> String {
        format!("{}.{}", self.path, name)
    }

    fn required(&self, name: &str) -> JsonResult<&'a Value> {
        match self.map.get(name) {
            Some(Value::Null) | None => {
                Err(field_error(&self.child_path(name), "missing required field"))
            }
            Some(value) => Ok(value),
        }
    }

    fn optional(&self, name: &str) -> Option<&'a Value> {
        match self.map.get(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    fn required_str(&self, name: &str) -> JsonResult<&'a str> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| field_error(&self.child_path(name), "expected a string"))
    }

    fn optional_str(&self, name: &str) -> JsonResult<Option<&'a str>> {
        self.optional(name)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| field_error(&self.child_path(name), "expected a string"))
            })
            .transpose()
    }

    fn required_f64(&self, name: &str) -> JsonResult<f64> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| field_error(&self.child_path(name), "expected a number"))
    }

    fn optional_f64(&self, name: &str) -> JsonResult<Option<f64>> {
        self.optional(name)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| field_error(&self.child_path(name), "expected a number"))
            })
            .transpose()
    }

    fn required_u64(&self, name: &str) -> JsonResult<u64> {
        self.required(name)?
            .as_u64()
            .ok_or_else(|| field_error(&self.child_path(name), "expected an unsigned integer"))
    }

    fn required_enum<E: FromStr<Err = crate::domain::EnumParseError>>(
        &self,
        name: &str,
    ) -> JsonResult<E> {
        E::from_str(self.required_str(name)?)
            .map_err(|error| field_error(&self.child_path(name), error))
    }

    fn optional_enum<E: FromStr<Err = crate::domain::EnumParseError>>(
        &self,
        name: &str,
    ) -> JsonResult<Option<E>> {
        self.optional_str(name)?
            .map(|value| {
                E::from_str(value).map_err(|error| field_error(&self.child_path(name), error))
            })
            .transpose()
    }

    fn required_array(&self, name: &str) -> JsonResult<&'a Vec<Value>> {
        self.required(name)?
            .as_array()
            .ok_or_else(|| field_error(&self.child_path(name), "expected an array"))
    }

    fn optional_array(&self, name: &str) -> JsonResult<Option<&'a Vec<Value>>> {
        self.optional(name)
            .map(|value| {
                value
                    .as_array()
                    .ok_or_else(|| field_error(&self.child_path(name), "expected an array"))
            })
            .transpose()
    }
}

fn parse_timestamp(value: &str, path: &str) -> JsonResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|error| field_error(path, error))
}

fn parse_date(value: &str, path: &str) -> JsonResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|error| field_error(path, error))
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

pub(crate) fn snapshot_to_value(snapshot: &Snapshot) -> Value {
    json!({
        "venue_id": snapshot.venue_id,
        "instruments": snapshot
            .instruments
            .iter()
            .map(instrument_state_to_value)
            .collect::<Vec<Value>>(),
    })
}

pub(crate) fn snapshot_from_value(value: &Value) -> JsonResult<Snapshot> {
    let reader = ObjectReader::new(value, "snapshot", &["venue_id", "instruments"])?;
    let venue_id = reader.required_str("venue_id")?.to_string();
    let mut instruments = Vec::new();
    for (index, entry) in reader.required_array("instruments")?.iter().enumerate() {
        instruments.push(instrument_state_from_value(
            entry,
            &format!("snapshot.instruments[{index}]"),
        )?);
    }
    Ok(Snapshot { venue_id, instruments })
}

fn instrument_state_to_value(state: &InstrumentState) -> Value {
    json!({
        "instrument": instrument_to_value(&state.instrument),
        "last_trade": state.last_trade.as_ref().map(trade_to_value).unwrap_or(Value::Null),
        "info": {
            "low_price": state.info.low_price.map(Price::value),
            "high_price": state.info.high_price.map(Price::value),
        },
        "order_book": {
            "buy_orders": state.order_book.buy_orders.iter().map(limit_order_to_value).collect::<Vec<Value>>(),
            "sell_orders": state.order_book.sell_orders.iter().map(limit_order_to_value).collect::<Vec<Value>>(),
        },
    })
}

fn instrument_state_from_value(value: &Value, path: &str) -> JsonResult<InstrumentState> {
    let reader =
        ObjectReader::new(value, path, &["instrument", "last_trade", "info", "order_book"])?;

    let instrument = instrument_from_value(reader.required("instrument")?, &reader.child_path("instrument"))?;
    let last_trade = reader
        .optional("last_trade")
        .map(|value| trade_from_value(value, &reader.child_path("last_trade")))
        .transpose()?;
    let info = match reader.optional("info") {
        Some(value) => info_from_value(value, &reader.child_path("info"))?,
        None => InstrumentInfo::default(),
    };
    let order_book =
        order_book_from_value(reader.required("order_book")?, &reader.child_path("order_book"))?;

    Ok(InstrumentState { instrument, last_trade, info, order_book })
}

fn info_from_value(value: &Value, path: &str) -> JsonResult<InstrumentInfo> {
    let reader = ObjectReader::new(value, path, &["low_price", "high_price"])?;
    Ok(InstrumentInfo {
        low_price: reader.optional_f64("low_price")?.map(Price::new),
        high_price: reader.optional_f64("high_price")?.map(Price::new),
    })
}

fn order_book_from_value(value: &Value, path: &str) -> JsonResult<OrderBookState> {
    let reader = ObjectReader::new(value, path, &["buy_orders", "sell_orders"])?;
    let mut order_book = OrderBookState::default();
    if let Some(orders) = reader.optional_array("buy_orders")? {
        for (index, entry) in orders.iter().enumerate() {
            order_book
                .buy_orders
                .push(limit_order_from_value(entry, &format!("{path}.buy_orders[{index}]"))?);
        }
    }
    if let Some(orders) = reader.optional_array("sell_orders")? {
        for (index, entry) in orders.iter().enumerate() {
            order_book
                .sell_orders
                .push(limit_order_from_value(entry, &format!("{path}.sell_orders[{index}]"))?);
        }
    }
    Ok(order_book)
}

// ─── Instrument ─────────────────────────────────────────────────────────────

fn instrument_to_value(instrument: &Instrument) -> Value {
    let mut map = Map::new();
    map.insert("symbol".into(), json!(instrument.symbol.value()));
    map.insert("security_type".into(), json!(instrument.security_type.as_str()));
    map.insert("price_currency".into(), json!(instrument.price_currency.value()));
    map.insert("base_currency".into(), json!(instrument.base_currency.value()));
    map.insert("security_exchange".into(), json!(instrument.security_exchange.value()));
    let identifiers = [
        ("cusip", &instrument.identifiers.cusip),
        ("sedol", &instrument.identifiers.sedol),
        ("isin", &instrument.identifiers.isin),
        ("ric", &instrument.identifiers.ric),
        ("exchange_id", &instrument.identifiers.exchange_id),
        ("bloomberg_id", &instrument.identifiers.bloomberg_id),
    ];
    for (name, identifier) in identifiers {
        if let Some(identifier) = identifier {
            map.insert(name.into(), json!(identifier.value()));
        }
    }
    if let Some(party_id) = &instrument.party_id {
        map.insert("party_id".into(), json!(party_id.value()));
    }
    if let Some(party_role) = instrument.party_role {
        map.insert("party_role".into(), json!(party_role.as_str()));
    }
    map.insert("price_tick".into(), json!(instrument.price_tick.value()));
    map.insert("quantity_tick".into(), json!(instrument.quantity_tick.value()));
    map.insert("min_quantity".into(), json!(instrument.min_quantity.value()));
    map.insert("max_quantity".into(), json!(instrument.max_quantity.value()));
    Value::Object(map)
}

fn instrument_from_value(value: &Value, path: &str) -> JsonResult<Instrument> {
    let reader = ObjectReader::new(
        value,
        path,
        &[
            "symbol",
            "security_type",
            "price_currency",
            "base_currency",
            "security_exchange",
            "cusip",
            "sedol",
            "isin",
            "ric",
            "exchange_id",
            "bloomberg_id",
            "party_id",
            "party_role",
            "price_tick",
            "quantity_tick",
            "min_quantity",
            "max_quantity",
        ],
    )?;

    Ok(Instrument {
        // Identity is re-established against the live catalogue on recovery.
        instrument_id: InstrumentId::new(0),
        symbol: Symbol::from(reader.required_str("symbol")?),
        security_type: reader.required_enum::<SecurityType>("security_type")?,
        price_currency: Currency::from(reader.required_str("price_currency")?),
        base_currency: Currency::from(reader.required_str("base_currency")?),
        security_exchange: SecurityExchange::from(reader.required_str("security_exchange")?),
        identifiers: SecurityIdentifiers {
            cusip: reader.optional_str("cusip")?.map(SecurityId::from),
            sedol: reader.optional_str("sedol")?.map(SecurityId::from),
            isin: reader.optional_str("isin")?.map(SecurityId::from),
            ric: reader.optional_str("ric")?.map(SecurityId::from),
            exchange_id: reader.optional_str("exchange_id")?.map(SecurityId::from),
            bloomberg_id: reader.optional_str("bloomberg_id")?.map(SecurityId::from),
        },
        party_id: reader.optional_str("party_id")?.map(PartyId::from),
        party_role: reader.optional_enum::<PartyRole>("party_role")?,
        price_tick: PriceTick::new(reader.required_f64("price_tick")?),
        quantity_tick: QuantityTick::new(reader.required_f64("quantity_tick")?),
        min_quantity: MinQuantity::new(reader.required_f64("min_quantity")?),
        max_quantity: MaxQuantity::new(reader.required_f64("max_quantity")?),
    })
}

// ─── Trade ──────────────────────────────────────────────────────────────────

fn trade_to_value(trade: &Trade) -> Value {
    json!({
        "buyer": trade.buyer,
        "seller": trade.seller,
        "price": trade.price.value(),
        "quantity": trade.quantity.value(),
        "aggressor_side": trade.aggressor_side.as_str(),
        "time": format_timestamp(trade.time),
        "phase": market_phase_to_value(trade.phase),
    })
}

fn trade_from_value(value: &Value, path: &str) -> JsonResult<Trade> {
    let reader = ObjectReader::new(
        value,
        path,
        &["buyer", "seller", "price", "quantity", "aggressor_side", "time", "phase"],
    )?;
    Ok(Trade {
        buyer: reader.optional_str("buyer")?.map(str::to_string),
        seller: reader.optional_str("seller")?.map(str::to_string),
        price: Price::new(reader.required_f64("price")?),
        quantity: Quantity::new(reader.required_f64("quantity")?),
        aggressor_side: reader.required_enum::<Side>("aggressor_side")?,
        time: parse_timestamp(reader.required_str("time")?, &reader.child_path("time"))?,
        phase: market_phase_from_value(reader.required("phase")?, &reader.child_path("phase"))?,
    })
}

fn market_phase_to_value(phase: MarketPhase) -> Value {
    json!({
        "trading_phase": phase.trading_phase.as_str(),
        "trading_status": phase.trading_status.as_str(),
    })
}

fn market_phase_from_value(value: &Value, path: &str) -> JsonResult<MarketPhase> {
    let reader = ObjectReader::new(value, path, &["trading_phase", "trading_status"])?;
    Ok(MarketPhase {
        trading_phase: reader.required_enum::<TradingPhase>("trading_phase")?,
        trading_status: reader.required_enum::<TradingStatus>("trading_status")?,
    })
}

// ─── Limit orders ───────────────────────────────────────────────────────────

fn limit_order_to_value(order: &LimitOrder) -> Value {
    let mut map = Map::new();
    map.insert(
        "client_instrument_descriptor".into(),
        descriptor_to_value(&order.client_instrument_descriptor),
    );
    map.insert("client_session".into(), session_to_value(&order.client_session));
    if let Some(client_order_id) = &order.client_order_id {
        map.insert("client_order_id".into(), json!(client_order_id.value()));
    }
    if !order.order_parties.is_empty() {
        map.insert(
            "order_parties".into(),
            Value::Array(order.order_parties.iter().map(party_to_value).collect()),
        );
    }
    if let Some(expire_time) = order.expire_time {
        map.insert("expire_time".into(), json!(format_timestamp(expire_time.value())));
    }
    if let Some(expire_date) = order.expire_date {
        map.insert("expire_date".into(), json!(expire_date.value().format(DATE_FORMAT).to_string()));
    }
    if let Some(reason) = order.short_sale_exemption_reason {
        map.insert("short_sale_exemption_reason".into(), json!(reason.value()));
    }
    map.insert("time_in_force".into(), json!(order.time_in_force.as_str()));
    map.insert("order_id".into(), json!(order.order_id.value()));
    map.insert("order_time".into(), json!(format_timestamp(order.order_time.value())));
    map.insert("side".into(), json!(order.side.as_str()));
    map.insert("order_status".into(), json!(order.order_status.as_str()));
    map.insert("order_price".into(), json!(order.order_price.value()));
    map.insert("total_quantity".into(), json!(order.total_quantity.value()));
    map.insert("cum_executed_quantity".into(), json!(order.cum_executed_quantity.value()));
    Value::Object(map)
}

fn limit_order_from_value(value: &Value, path: &str) -> JsonResult<LimitOrder> {
    let reader = ObjectReader::new(
        value,
        path,
        &[
            "client_instrument_descriptor",
            "client_session",
            "client_order_id",
            "order_parties",
            "expire_time",
            "expire_date",
            "short_sale_exemption_reason",
            "time_in_force",
            "order_id",
            "order_time",
            "side",
            "order_status",
            "order_price",
            "total_quantity",
            "cum_executed_quantity",
        ],
    )?;

    let mut order_parties = Vec::new();
    if let Some(parties) = reader.optional_array("order_parties")? {
        for (index, entry) in parties.iter().enumerate() {
            order_parties.push(party_from_value(entry, &format!("{path}.order_parties[{index}]"))?);
        }
    }

    Ok(LimitOrder {
        order_id: OrderId::new(reader.required_u64("order_id")?),
        client_session: session_from_value(
            reader.required("client_session")?,
            &reader.child_path("client_session"),
        )?,
        client_order_id: reader.optional_str("client_order_id")?.map(ClientOrderId::from),
        orig_client_order_id: None,
        side: reader.required_enum::<Side>("side")?,
        time_in_force: reader.required_enum::<TimeInForce>("time_in_force")?,
        order_price: Price::new(reader.required_f64("order_price")?),
        total_quantity: Quantity::new(reader.required_f64("total_quantity")?),
        cum_executed_quantity: Quantity::new(reader.required_f64("cum_executed_quantity")?),
        order_status: reader.required_enum::<OrderStatus>("order_status")?,
        order_time: OrderTime::new(parse_timestamp(
            reader.required_str("order_time")?,
            &reader.child_path("order_time"),
        )?),
        expire_time: reader
            .optional_str("expire_time")?
            .map(|value| parse_timestamp(value, &reader.child_path("expire_time")))
            .transpose()?
            .map(ExpireTime::new),
        expire_date: reader
            .optional_str("expire_date")?
            .map(|value| parse_date(value, &reader.child_path("expire_date")))
            .transpose()?
            .map(ExpireDate::new),
        short_sale_exemption_reason: reader
            .optional("short_sale_exemption_reason")
            .map(|value| {
                value.as_i64().map(|reason| ShortSaleExemptionReason::new(reason as i32)).ok_or_else(
                    || {
                        field_error(
                            &reader.child_path("short_sale_exemption_reason"),
                            "expected an integer",
                        )
                    },
                )
            })
            .transpose()?,
        client_instrument_descriptor: match reader.optional("client_instrument_descriptor") {
            Some(value) => descriptor_from_value(
                value,
                &reader.child_path("client_instrument_descriptor"),
            )?,
            None => InstrumentDescriptor::default(),
        },
        order_parties,
    })
}

// ─── Sessions, descriptors, parties ─────────────────────────────────────────

fn session_to_value(session: &Session) -> Value {
    match session {
        Session::Fix(fix) => {
            let mut map = Map::new();
            map.insert("type".into(), json!("Fix"));
            map.insert("begin_string".into(), json!(fix.begin_string.value()));
            map.insert("sender_comp_id".into(), json!(fix.sender_comp_id.value()));
            map.insert("target_comp_id".into(), json!(fix.target_comp_id.value()));
            if let Some(client_sub_id) = &fix.client_sub_id {
                map.insert("client_sub_id".into(), json!(client_sub_id.value()));
            }
            Value::Object(map)
        }
        Session::Generator => json!({ "type": "Generator" }),
    }
}

fn session_from_value(value: &Value, path: &str) -> JsonResult<Session> {
    let reader = ObjectReader::new(
        value,
        path,
        &["type", "begin_string", "sender_comp_id", "target_comp_id", "client_sub_id"],
    )?;
    match reader.required_str("type")? {
        "Generator" => Ok(Session::Generator),
        "Fix" => {
            let mut session = FixSession::new(
                reader.required_str("begin_string")?.into(),
                reader.required_str("sender_comp_id")?.into(),
                reader.required_str("target_comp_id")?.into(),
            );
            if let Some(client_sub_id) = reader.optional_str("client_sub_id")? {
                session = session.with_client_sub_id(client_sub_id.into());
            }
            Ok(Session::Fix(session))
        }
        other => Err(field_error(
            &reader.child_path("type"),
            format!("'{other}' is not a known session type"),
        )),
    }
}

fn descriptor_to_value(descriptor: &InstrumentDescriptor) -> Value {
    let mut map = Map::new();
    if let Some(security_id) = &descriptor.security_id {
        map.insert("security_id".into(), json!(security_id.value()));
    }
    if let Some(source) = descriptor.security_id_source {
        map.insert("security_id_source".into(), json!(source.as_str()));
    }
    if let Some(symbol) = &descriptor.symbol {
        map.insert("symbol".into(), json!(symbol.value()));
    }
    if let Some(exchange) = &descriptor.security_exchange {
        map.insert("security_exchange".into(), json!(exchange.value()));
    }
    if let Some(currency) = &descriptor.currency {
        map.insert("currency".into(), json!(currency.value()));
    }
    if let Some(security_type) = descriptor.security_type {
        map.insert("security_type".into(), json!(security_type.as_str()));
    }
    if !descriptor.parties.is_empty() {
        map.insert(
            "parties".into(),
            Value::Array(descriptor.parties.iter().map(party_to_value).collect()),
        );
    }
    Value::Object(map)
}

fn descriptor_from_value(value: &Value, path: &str) -> JsonResult<InstrumentDescriptor> {
    let reader = ObjectReader::new(
        value,
        path,
        &[
            "security_id",
            "security_id_source",
            "symbol",
            "security_exchange",
            "currency",
            "security_type",
            "parties",
        ],
    )?;
    let mut parties = Vec::new();
    if let Some(entries) = reader.optional_array("parties")? {
        for (index, entry) in entries.iter().enumerate() {
            parties.push(party_from_value(entry, &format!("{path}.parties[{index}]"))?);
        }
    }
    Ok(InstrumentDescriptor {
        security_id: reader.optional_str("security_id")?.map(SecurityId::from),
        security_id_source: reader.optional_enum::<SecurityIdSource>("security_id_source")?,
        symbol: reader.optional_str("symbol")?.map(Symbol::from),
        security_exchange: reader.optional_str("security_exchange")?.map(SecurityExchange::from),
        currency: reader.optional_str("currency")?.map(Currency::from),
        security_type: reader.optional_enum::<SecurityType>("security_type")?,
        parties,
    })
}

fn party_to_value(party: &Party) -> Value {
    json!({
        "party_id": party.party_id.value(),
        "source": party.source.as_str(),
        "role": party.role.as_str(),
    })
}

fn party_from_value(value: &Value, path: &str) -> JsonResult<Party> {
    let reader = ObjectReader::new(value, path, &["party_id", "source", "role"])?;
    Ok(Party {
        party_id: PartyId::from(reader.required_str("party_id")?),
        source: reader.required_enum::<PartyIdSource>("source")?,
        role: reader.required_enum::<PartyRole>("role")?,
    })
}
