//! The market-state persistence controller.
//!
//! Stores the state of every engine into the configured file and recovers
//! it on cold start. All outcomes are reported as codes, never as panics or
//! errors thrown across the boundary.

use crate::persistence::serializer::MarketStateSerializer;
use crate::persistence::state::{InstrumentState, Snapshot};
use std::fs::File;
use std::path::Path;
use tracing::{error, info};

/// Outcome of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMarketState {
    Stored,
    PersistenceDisabled,
    PersistenceFilePathIsEmpty,
    PersistenceFilePathIsUnreachable,
    ErrorWhenOpeningPersistenceFile,
    ErrorWhenWritingToPersistenceFile,
}

/// Outcome of a recover operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverMarketState {
    Recovered,
    PersistenceDisabled,
    PersistenceFilePathIsEmpty,
    PersistenceFilePathIsUnreachable,
    ErrorWhenOpeningPersistenceFile,
    PersistenceFileIsMalformed,
}

/// Recover outcome together with the serializer's error text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverResult {
    pub code: RecoverMarketState,
    pub error: Option<String>,
}

impl RecoverResult {
    fn code(code: RecoverMarketState) -> Self {
        Self { code, error: None }
    }
}

/// The state-capture seam the controller drives.
///
/// Implemented by the execution system: `capture` fills one state record
/// per instrument in catalogue order, `restore` routes each record back to
/// its engine by instrument identity.
pub trait MarketStateExecutor: Send + Sync {
    fn capture(&self, instruments: &mut Vec<InstrumentState>);
    fn restore(&self, instruments: Vec<InstrumentState>);
}

/// Persistence settings entering the core from the environment.
#[derive(Debug, Clone, Default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub file_path: String,
}

/// Builds, writes and recovers whole-venue snapshots.
pub struct PersistenceController {
    config: PersistenceConfig,
    venue_id: String,
    serializer: Box<dyn MarketStateSerializer>,
}

impl PersistenceController {
    #[must_use]
    pub fn new(
        config: PersistenceConfig,
        venue_id: impl Into<String>,
        serializer: Box<dyn MarketStateSerializer>,
    ) -> Self {
        Self { config, venue_id: venue_id.into(), serializer }
    }

    /// Captures every engine's state and writes the snapshot file.
    pub fn store(&self, executor: &dyn MarketStateExecutor) -> StoreMarketState {
        if !self.config.enabled {
            info!("the market state was not stored: the persistence is disabled");
            return StoreMarketState::PersistenceDisabled;
        }

        let file_path = Path::new(&self.config.file_path);
        if self.config.file_path.is_empty() {
            error!("the market state was not stored: the persistence file path is empty");
            return StoreMarketState::PersistenceFilePathIsEmpty;
        }
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                error!(
                    "the market state was not stored: the persistence file path directory \
                     does not exist"
                );
                return StoreMarketState::PersistenceFilePathIsUnreachable;
            }
        }

        let mut snapshot =
            Snapshot { venue_id: self.venue_id.clone(), instruments: Vec::new() };
        executor.capture(&mut snapshot.instruments);

        let mut file = match File::create(file_path) {
            Ok(file) => file,
            Err(cause) => {
                error!(%cause, "the market state was not stored: unable to open the file");
                return StoreMarketState::ErrorWhenOpeningPersistenceFile;
            }
        };

        match self.serializer.serialize(&snapshot, &mut file) {
            Ok(()) => {
                info!(
                    instruments = snapshot.instruments.len(),
                    path = %file_path.display(),
                    "market state stored"
                );
                StoreMarketState::Stored
            }
            Err(cause) => {
                error!(%cause, "the market state was not stored: unable to write the file");
                StoreMarketState::ErrorWhenWritingToPersistenceFile
            }
        }
    }

    /// Reads the snapshot file and routes each state to its engine.
    pub fn recover(&self, executor: &dyn MarketStateExecutor) -> RecoverResult {
        if !self.config.enabled {
            info!("the market state was not recovered: the persistence is disabled");
            return RecoverResult::code(RecoverMarketState::PersistenceDisabled);
        }

        let file_path = Path::new(&self.config.file_path);
        if self.config.file_path.is_empty() {
            info!("the market state was not recovered: the persistence file path is empty");
            return RecoverResult::code(RecoverMarketState::PersistenceFilePathIsEmpty);
        }
        if !file_path.exists() || file_path.is_dir() {
            info!("the market state was not recovered: the persistence file path is unreachable");
            return RecoverResult::code(RecoverMarketState::PersistenceFilePathIsUnreachable);
        }

        let mut file = match File::open(file_path) {
            Ok(file) => file,
            Err(cause) => {
                error!(%cause, "the market state was not recovered: unable to open the file");
                return RecoverResult::code(RecoverMarketState::ErrorWhenOpeningPersistenceFile);
            }
        };

        let snapshot = match self.serializer.deserialize(&mut file) {
            Ok(snapshot) => snapshot,
            Err(cause) => {
                error!(%cause, "the market state was not recovered: the file is malformed");
                return RecoverResult {
                    code: RecoverMarketState::PersistenceFileIsMalformed,
                    error: Some(cause.message().to_string()),
                };
            }
        };

        info!(
            instruments = snapshot.instruments.len(),
            path = %file_path.display(),
            "recovering market state"
        );
        executor.restore(snapshot.instruments);
        RecoverResult::code(RecoverMarketState::Recovered)
    }
}
