//! Nominal attribute types wrapping primitive values.
//!
//! Every domain field is a distinct newtype so that unrelated values cannot
//! be mixed accidentally (a `Price` is never a `Quantity`, a `ClientOrderId`
//! is never a `Symbol`). Float-backed attributes normalise their fractional
//! part to a fixed 10⁻¹⁰ grid at construction, which makes values that
//! round-trip through a textual wire representation compare equal again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution of the fractional grid used by float-backed attributes.
const FRACTION_GRID: f64 = 1e10;

/// Snaps a raw floating-point value onto the 10⁻¹⁰ grid.
///
/// Negative zero is collapsed into positive zero so that normalised values
/// are usable as ordered map keys.
pub(crate) fn normalize_fraction(value: f64) -> f64 {
    let snapped = (value * FRACTION_GRID).round() / FRACTION_GRID;
    if snapped == 0.0 { 0.0 } else { snapped }
}

macro_rules! float_attribute {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name(f64);

        impl $name {
            /// Creates the attribute, snapping the value onto the 10⁻¹⁰ grid.
            #[must_use]
            pub fn new(value: f64) -> Self {
                Self(normalize_fraction(value))
            }

            /// Returns the normalised primitive value.
            #[must_use]
            #[inline]
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_f64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                f64::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

macro_rules! literal_attribute {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            #[inline]
            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// ─── Prices and quantities ──────────────────────────────────────────────────

float_attribute!(
    /// A price value.
    ///
    /// Prices carried on requests and resting orders are normalised at
    /// construction; all comparisons use the normalised value, so a price
    /// that travelled through a decimal wire representation is equal to the
    /// price it was built from.
    Price
);

float_attribute!(
    /// An order quantity (total, executed, or leaves).
    Quantity
);

float_attribute!(
    /// Minimum price increment configured for an instrument.
    PriceTick
);

float_attribute!(
    /// Minimum quantity increment configured for an instrument.
    QuantityTick
);

float_attribute!(
    /// Smallest order quantity an instrument accepts.
    MinQuantity
);

float_attribute!(
    /// Largest order quantity an instrument accepts.
    MaxQuantity
);

impl Price {
    /// Reports whether the price is a positive exact multiple of `tick`.
    #[must_use]
    pub fn respects_tick(self, tick: PriceTick) -> bool {
        self.0 > 0.0 && is_grid_multiple(self.0, tick.value())
    }
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    /// Reports whether the quantity is an exact multiple of `tick`.
    #[must_use]
    pub fn respects_tick(self, tick: QuantityTick) -> bool {
        is_grid_multiple(self.0, tick.value())
    }

    /// Largest multiple of `tick` that does not exceed this quantity.
    ///
    /// Used by the matching loop to truncate a fill to the instrument's
    /// quantity grid. A non-positive tick leaves the quantity untouched.
    #[must_use]
    pub fn truncate_to_tick(self, tick: QuantityTick) -> Quantity {
        let tick = tick.value();
        if tick <= 0.0 {
            return self;
        }
        Quantity::new((self.0 / tick).floor() * tick)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Saturating subtraction; never returns a negative quantity.
    #[must_use]
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity::new((self.0 - other.0).max(0.0))
    }

    #[must_use]
    pub fn add(self, other: Quantity) -> Quantity {
        Quantity::new(self.0 + other.0)
    }

    #[must_use]
    pub fn min(self, other: Quantity) -> Quantity {
        if self <= other { self } else { other }
    }
}

/// Exact-multiple check on the normalised 10⁻¹⁰ grid.
fn is_grid_multiple(value: f64, tick: f64) -> bool {
    if tick <= 0.0 {
        return true;
    }
    let steps = (value / tick).round();
    normalize_fraction(steps * tick) == normalize_fraction(value)
}

// ─── Identifiers ────────────────────────────────────────────────────────────

/// Engine-scoped order identifier.
///
/// Dense and monotonically increasing per engine; its decimal rendering is
/// the wire-level `VenueOrderId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution identifier: `<venue-order-id>-<per-order sequence from 1>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Builds the identifier for the `sequence`-th execution of `order_id`.
    #[must_use]
    pub fn new(order_id: OrderId, sequence: u64) -> Self {
        Self(format!("{order_id}-{sequence}"))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dense catalogue-assigned instrument identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(u32);

impl InstrumentId {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

literal_attribute!(
    /// Client-assigned order identifier (FIX `ClOrdID`).
    ClientOrderId
);

literal_attribute!(
    /// Instrument ticker symbol.
    Symbol
);

literal_attribute!(
    /// ISO 4217 currency code.
    Currency
);

literal_attribute!(
    /// Exchange (MIC) on which an instrument is listed.
    SecurityExchange
);

literal_attribute!(
    /// Security identifier, qualified by a `SecurityIdSource`.
    SecurityId
);

literal_attribute!(
    /// Identifier of a trading party.
    PartyId
);

literal_attribute!(
    /// Client-assigned market-data request identifier (FIX `MDReqID`).
    MdRequestId
);

literal_attribute!(
    /// Client-assigned security-status request identifier.
    SecurityStatusReqId
);

literal_attribute!(
    /// Human-readable reject text carried on reject notifications.
    RejectText
);

literal_attribute!(
    /// FIX `BeginString` of a client session.
    BeginString
);

literal_attribute!(
    /// FIX `SenderCompID` of a client session.
    SenderCompId
);

literal_attribute!(
    /// FIX `TargetCompID` of a client session.
    TargetCompId
);

literal_attribute!(
    /// FIX `SenderSubID`; routes replies, excluded from session identity.
    ClientSubId
);

/// Reason code attached to short-sale-exempt orders (FIX tag 1688).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortSaleExemptionReason(i32);

impl ShortSaleExemptionReason {
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ShortSaleExemptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Timestamps ─────────────────────────────────────────────────────────────

/// Wall-clock instant at which an engine accepted an order, in UTC with
/// microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderTime(DateTime<Utc>);

impl OrderTime {
    #[must_use]
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(crate::utils::truncate_to_micros(value))
    }

    #[must_use]
    pub fn value(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for OrderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::utils::format_micros(self.0))
    }
}

/// UTC deadline of a good-till-date order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpireTime(DateTime<Utc>);

impl ExpireTime {
    #[must_use]
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(crate::utils::truncate_to_micros(value))
    }

    #[must_use]
    pub fn value(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for ExpireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::utils::format_micros(self.0))
    }
}

/// Local trading day on which a good-till-date order expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpireDate(NaiveDate);

impl ExpireDate {
    #[must_use]
    pub const fn new(value: NaiveDate) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for ExpireDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_round_trip_through_decimal_text_compares_equal() {
        let original = Price::new(10.07);
        let reparsed = Price::new("10.07".parse::<f64>().unwrap());
        assert_eq!(original, reparsed);
    }

    #[test]
    fn normalization_snaps_accumulated_float_error() {
        // 0.1 + 0.2 is not 0.3 in raw f64 arithmetic.
        let accumulated = Price::new(0.1 + 0.2);
        assert_eq!(accumulated, Price::new(0.3));
    }

    #[test]
    fn price_respects_tick() {
        let tick = PriceTick::new(0.01);
        assert!(Price::new(10.07).respects_tick(tick));
        assert!(!Price::new(10.073).respects_tick(tick));
        assert!(!Price::new(0.0).respects_tick(tick));
        assert!(!Price::new(-10.07).respects_tick(tick));
    }

    #[test]
    fn quantity_truncates_to_tick_multiple() {
        let tick = QuantityTick::new(10.0);
        assert_eq!(Quantity::new(37.0).truncate_to_tick(tick), Quantity::new(30.0));
        assert_eq!(Quantity::new(40.0).truncate_to_tick(tick), Quantity::new(40.0));
    }

    #[test]
    fn quantity_saturating_sub_never_goes_negative() {
        let result = Quantity::new(10.0).saturating_sub(Quantity::new(25.0));
        assert_eq!(result, Quantity::ZERO);
    }

    #[test]
    fn negative_zero_collapses_to_positive_zero() {
        assert_eq!(Price::new(-0.0), Price::new(0.0));
    }

    #[test]
    fn execution_id_format() {
        let id = ExecutionId::new(OrderId::new(100000000000000321), 1);
        assert_eq!(id.value(), "100000000000000321-1");
    }

    #[test]
    fn float_attribute_serde_round_trip() {
        let price = Price::new(10.07);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "10.07");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
