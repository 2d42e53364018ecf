//! Top-level configuration of the simulator core.

use crate::engine::EngineConfig;
use crate::execution::QueueConfig;
use crate::persistence::PersistenceConfig;
use std::time::Duration;
use tracing::warn;

/// Environment variable holding the persistence-enabled flag.
pub const ENV_PERSISTENCE_ENABLED: &str = "VENUE_PERSISTENCE_ENABLED";
/// Environment variable holding the persistence file path.
pub const ENV_PERSISTENCE_FILE_PATH: &str = "VENUE_PERSISTENCE_FILE_PATH";

/// Settings for a whole trading-system instance.
///
/// Only the two persistence values enter from the environment; everything
/// else is supplied by the embedding process at construction.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub venue_id: String,
    pub persistence: PersistenceConfig,
    pub queue: QueueConfig,
    pub engine: EngineConfig,
    /// Interval of the phase/tick event loop.
    pub tick_interval: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            venue_id: "XSIM".to_string(),
            persistence: PersistenceConfig::default(),
            queue: QueueConfig::default(),
            engine: EngineConfig::default(),
            tick_interval: Duration::from_millis(100),
        }
    }
}

impl SimulationConfig {
    /// Defaults overlaid with the persistence settings from the
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(ENV_PERSISTENCE_ENABLED) {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.persistence.enabled = true,
                "0" | "false" | "no" => config.persistence.enabled = false,
                other => warn!(value = other, "unrecognised persistence-enabled value, keeping default"),
            }
        }
        if let Ok(value) = std::env::var(ENV_PERSISTENCE_FILE_PATH) {
            config.persistence.file_path = value;
        }
        config
    }
}
