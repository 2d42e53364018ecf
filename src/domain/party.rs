//! Trading parties attached to orders and instruments.

use crate::domain::attributes::PartyId;
use crate::domain::enums::{PartyIdSource, PartyRole};
use serde::{Deserialize, Serialize};

/// One party entry of a FIX party repeating group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: PartyId,
    pub source: PartyIdSource,
    pub role: PartyRole,
}

impl Party {
    #[must_use]
    pub fn new(party_id: PartyId, source: PartyIdSource, role: PartyRole) -> Self {
        Self { party_id, source, role }
    }
}
