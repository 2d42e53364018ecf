//! Instrument definitions and client-side instrument descriptors.

use crate::domain::attributes::{
    Currency, InstrumentId, MaxQuantity, MinQuantity, PartyId, PriceTick, QuantityTick,
    SecurityExchange, SecurityId, Symbol,
};
use crate::domain::enums::{PartyRole, SecurityIdSource, SecurityType};
use crate::domain::party::Party;
use serde::{Deserialize, Serialize};

/// Alternative security identifiers of an instrument.
///
/// Each populated identifier becomes one entry in the resolver's lookup
/// indices; all of them must point at the same instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIdentifiers {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cusip: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sedol: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub isin: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ric: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exchange_id: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bloomberg_id: Option<SecurityId>,
}

impl SecurityIdentifiers {
    /// The identifier qualified by `source`, if populated.
    #[must_use]
    pub fn by_source(&self, source: SecurityIdSource) -> Option<&SecurityId> {
        match source {
            SecurityIdSource::Cusip => self.cusip.as_ref(),
            SecurityIdSource::Sedol => self.sedol.as_ref(),
            SecurityIdSource::Isin => self.isin.as_ref(),
            SecurityIdSource::Ric => self.ric.as_ref(),
            SecurityIdSource::ExchangeSymbol => self.exchange_id.as_ref(),
            SecurityIdSource::BloombergSymbol => self.bloomberg_id.as_ref(),
        }
    }
}

/// An immutable instrument row as loaded into the catalogue.
///
/// `instrument_id` is assigned densely at catalogue build; every other
/// attribute is configuration. The tick and min/max constraints drive the
/// engine's validation chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_id: InstrumentId,
    pub symbol: Symbol,
    pub security_type: SecurityType,
    pub price_currency: Currency,
    pub base_currency: Currency,
    pub security_exchange: SecurityExchange,
    #[serde(default)]
    pub identifiers: SecurityIdentifiers,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub party_id: Option<PartyId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub party_role: Option<PartyRole>,
    pub price_tick: PriceTick,
    pub quantity_tick: QuantityTick,
    pub min_quantity: MinQuantity,
    pub max_quantity: MaxQuantity,
}

impl Instrument {
    /// Builds the descriptor carrying this instrument's identifying
    /// attributes, used on replies and to re-associate persisted state.
    #[must_use]
    pub fn descriptor(&self) -> InstrumentDescriptor {
        InstrumentDescriptor {
            symbol: Some(self.symbol.clone()),
            security_exchange: Some(self.security_exchange.clone()),
            security_type: Some(self.security_type),
            currency: Some(self.price_currency.clone()),
            ..InstrumentDescriptor::default()
        }
    }
}

/// A bundle of possibly-partial instrument identifiers supplied by a client.
///
/// The resolver maps a descriptor onto exactly one `InstrumentId` or a
/// typed resolution failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_id: Option<SecurityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_id_source: Option<SecurityIdSource>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_exchange: Option<SecurityExchange>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_type: Option<SecurityType>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parties: Vec<Party>,
}

impl InstrumentDescriptor {
    /// Shorthand for a descriptor holding only a symbol.
    #[must_use]
    pub fn for_symbol(symbol: impl Into<Symbol>) -> Self {
        Self { symbol: Some(symbol.into()), ..Self::default() }
    }

    /// True when no identifying attribute is populated.
    ///
    /// Currency and security type narrow a lookup but cannot identify an
    /// instrument on their own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.security_id.is_none() && self.symbol.is_none() && self.parties.is_empty()
    }
}
