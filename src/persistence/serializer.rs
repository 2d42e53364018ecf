//! Pluggable market-state serialisation.
//!
//! The controller only depends on the [`MarketStateSerializer`] trait; the
//! JSON implementation below is the production format.

use crate::persistence::json;
use crate::persistence::state::Snapshot;
use std::io::{Read, Write};

/// Failure to serialise or deserialise a market-state snapshot.
///
/// The message is surfaced verbatim to the operator alongside the
/// `PersistenceFileIsMalformed` code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SerializerError {
    message: String,
}

impl SerializerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts a snapshot to and from a byte stream.
pub trait MarketStateSerializer: Send + Sync {
    fn serialize(&self, snapshot: &Snapshot, out: &mut dyn Write) -> Result<(), SerializerError>;
    fn deserialize(&self, input: &mut dyn Read) -> Result<Snapshot, SerializerError>;
}

/// The production serializer: strict UTF-8 JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarketStateSerializer;

impl JsonMarketStateSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MarketStateSerializer for JsonMarketStateSerializer {
    fn serialize(&self, snapshot: &Snapshot, out: &mut dyn Write) -> Result<(), SerializerError> {
        let value = json::snapshot_to_value(snapshot);
        serde_json::to_writer_pretty(&mut *out, &value)
            .map_err(|error| SerializerError::new(error.to_string()))?;
        out.write_all(b"\n").map_err(|error| SerializerError::new(error.to_string()))
    }

    fn deserialize(&self, input: &mut dyn Read) -> Result<Snapshot, SerializerError> {
        let value: serde_json::Value = serde_json::from_reader(input)
            .map_err(|error| SerializerError::new(error.to_string()))?;
        json::snapshot_from_value(&value)
    }
}
