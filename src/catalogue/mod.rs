//! The immutable instrument catalogue and descriptor resolver.
//!
//! Built once at startup; read-only afterwards and safe for unsynchronised
//! concurrent reads. Every non-empty identifying attribute of every
//! instrument populates one entry in the matching lookup index, and the
//! build fails if two instruments would share an identifier (resolution
//! stays injective).

use crate::domain::{
    Instrument, InstrumentDescriptor, InstrumentId, PartyId, PartyRole, SecurityExchange,
    SecurityId, SecurityIdSource, Symbol,
};
use std::collections::HashMap;
use tracing::info;

/// Failure to resolve an instrument descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No index holds any of the descriptor's identifiers.
    #[error("instrument is not found")]
    NotFound,
    /// Different identifiers point at different instruments.
    #[error("instrument descriptor is ambiguous")]
    Ambiguous,
    /// The descriptor contains no usable identifier.
    #[error("instrument descriptor contains no usable identifier")]
    Empty,
}

/// Failure to build the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    /// Two instruments carry the same identifier.
    #[error("duplicate {kind} identifier '{value}'")]
    DuplicateIdentifier {
        kind: &'static str,
        value: String,
    },
}

const ALL_ID_SOURCES: [SecurityIdSource; 6] = [
    SecurityIdSource::Cusip,
    SecurityIdSource::Sedol,
    SecurityIdSource::Isin,
    SecurityIdSource::Ric,
    SecurityIdSource::ExchangeSymbol,
    SecurityIdSource::BloombergSymbol,
];

/// Immutable mapping from any identifying attribute to an [`InstrumentId`].
#[derive(Debug, Default)]
pub struct InstrumentCatalogue {
    instruments: Vec<Instrument>,
    by_security_id: HashMap<(SecurityIdSource, SecurityId), InstrumentId>,
    by_symbol: HashMap<Symbol, Vec<(SecurityExchange, InstrumentId)>>,
    by_party: HashMap<(PartyId, PartyRole), InstrumentId>,
}

impl InstrumentCatalogue {
    /// Builds the catalogue, assigning dense instrument identifiers in input
    /// order (any identifier already present on a row is overwritten).
    pub fn build(mut rows: Vec<Instrument>) -> Result<Self, CatalogueError> {
        let mut catalogue = InstrumentCatalogue::default();

        for (index, instrument) in rows.iter_mut().enumerate() {
            let id = InstrumentId::new(index as u32);
            instrument.instrument_id = id;

            for source in ALL_ID_SOURCES {
                if let Some(security_id) = instrument.identifiers.by_source(source) {
                    let key = (source, security_id.clone());
                    if catalogue.by_security_id.insert(key, id).is_some() {
                        return Err(CatalogueError::DuplicateIdentifier {
                            kind: source.as_str(),
                            value: security_id.value().to_string(),
                        });
                    }
                }
            }

            let listings = catalogue.by_symbol.entry(instrument.symbol.clone()).or_default();
            if listings.iter().any(|(exchange, _)| *exchange == instrument.security_exchange) {
                return Err(CatalogueError::DuplicateIdentifier {
                    kind: "symbol",
                    value: format!("{}@{}", instrument.symbol, instrument.security_exchange),
                });
            }
            listings.push((instrument.security_exchange.clone(), id));

            if let (Some(party_id), Some(party_role)) =
                (&instrument.party_id, instrument.party_role)
            {
                let key = (party_id.clone(), party_role);
                if catalogue.by_party.insert(key, id).is_some() {
                    return Err(CatalogueError::DuplicateIdentifier {
                        kind: "party",
                        value: party_id.value().to_string(),
                    });
                }
            }
        }

        catalogue.instruments = rows;
        info!(instruments = catalogue.instruments.len(), "instrument catalogue built");
        Ok(catalogue)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id.value() as usize)
    }

    /// Instruments in catalogue order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> + '_ {
        self.instruments.iter()
    }

    /// Resolves a descriptor to exactly one instrument.
    ///
    /// Identifiers are consulted in the defined precedence: explicit
    /// security-id (qualified by its source when given), then symbol plus
    /// exchange, then the (party-id, party-role) pairs. Every identifier the
    /// descriptor carries must name the same instrument; an identifier that
    /// names no instrument makes the whole resolution `NotFound`, two
    /// identifiers naming different instruments make it `Ambiguous`.
    pub fn resolve(&self, descriptor: &InstrumentDescriptor) -> Result<InstrumentId, ResolutionError> {
        if descriptor.is_empty() {
            return Err(ResolutionError::Empty);
        }

        let mut resolved: Option<InstrumentId> = None;

        if let Some(security_id) = &descriptor.security_id {
            let candidate = self.lookup_security_id(security_id, descriptor.security_id_source)?;
            merge_candidate(&mut resolved, candidate)?;
        }

        if let Some(symbol) = &descriptor.symbol {
            let candidate =
                self.lookup_symbol(symbol, descriptor.security_exchange.as_ref())?;
            merge_candidate(&mut resolved, candidate)?;
        }

        for party in &descriptor.parties {
            let candidate = self
                .by_party
                .get(&(party.party_id.clone(), party.role))
                .copied()
                .ok_or(ResolutionError::NotFound)?;
            merge_candidate(&mut resolved, candidate)?;
        }

        resolved.ok_or(ResolutionError::NotFound)
    }

    fn lookup_security_id(
        &self,
        security_id: &SecurityId,
        source: Option<SecurityIdSource>,
    ) -> Result<InstrumentId, ResolutionError> {
        if let Some(source) = source {
            return self
                .by_security_id
                .get(&(source, security_id.clone()))
                .copied()
                .ok_or(ResolutionError::NotFound);
        }

        // Unqualified identifier: search every index and require agreement.
        let mut found: Option<InstrumentId> = None;
        for candidate_source in ALL_ID_SOURCES {
            if let Some(id) =
                self.by_security_id.get(&(candidate_source, security_id.clone()))
            {
                match found {
                    Some(existing) if existing != *id => return Err(ResolutionError::Ambiguous),
                    _ => found = Some(*id),
                }
            }
        }
        found.ok_or(ResolutionError::NotFound)
    }

    fn lookup_symbol(
        &self,
        symbol: &Symbol,
        exchange: Option<&SecurityExchange>,
    ) -> Result<InstrumentId, ResolutionError> {
        let listings = self.by_symbol.get(symbol).ok_or(ResolutionError::NotFound)?;
        match exchange {
            Some(exchange) => listings
                .iter()
                .find(|(listed, _)| listed == exchange)
                .map(|(_, id)| *id)
                .ok_or(ResolutionError::NotFound),
            None => {
                if listings.len() == 1 {
                    Ok(listings[0].1)
                } else {
                    // The symbol alone names several listings.
                    Err(ResolutionError::Ambiguous)
                }
            }
        }
    }
}

fn merge_candidate(
    resolved: &mut Option<InstrumentId>,
    candidate: InstrumentId,
) -> Result<(), ResolutionError> {
    match resolved {
        Some(existing) if *existing != candidate => Err(ResolutionError::Ambiguous),
        _ => {
            *resolved = Some(candidate);
            Ok(())
        }
    }
}
