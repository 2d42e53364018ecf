//! The per-instrument matching engine and its supporting parts.

#[allow(clippy::module_inception)]
mod engine;
mod events;
mod market_data;
mod phase;
mod validation;

pub use engine::{DisconnectPolicy, EngineConfig, MatchingEngine};
pub use events::{PhaseTransition, Tick};
pub use market_data::{MarketDataPublisher, MarketView, MdEntryFlags};
pub use phase::SecurityStatusTracker;
pub use validation::{ClientRequestValidator, ValidationError, ValidatorConfig};
