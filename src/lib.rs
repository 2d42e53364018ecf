//! # FIX Market Simulator Core
//!
//! The matching core of a FIX-protocol market simulator: per-instrument
//! matching engines behind a request-routing layer, with market-data
//! publication, trading-phase reporting and JSON market-state persistence.
//!
//! ## Key Components
//!
//! - **Domain model** ([`domain`]): nominal attribute newtypes over every
//!   primitive field, enums with lossless string round-trips, instruments,
//!   parties and client sessions. Float-backed attributes snap to a 10⁻¹⁰
//!   grid at construction so values survive textual wire round-trips.
//!
//! - **Order book** ([`book`]): two price-ordered sides with FIFO levels,
//!   price-time-priority matching, modification semantics that reset time
//!   priority on price changes and preserve it on pure quantity decreases.
//!
//! - **Matching engine** ([`engine`]): validation checker chain with
//!   canonical reject texts, order lifecycle management, market-data
//!   subscriptions with snapshot and New/Change/Delete incremental updates,
//!   security-status reporting, expiry and phase handling, snapshot
//!   store/recover.
//!
//! - **Execution system** ([`execution`]): the instrument resolver routes
//!   each request onto the owning engine's bounded FIFO command queue; a
//!   worker pool of `min(instruments, cpus)` threads drains queues with
//!   strict per-engine serialisation. Unroutable requests receive typed
//!   rejects with generated 18-digit venue order ids.
//!
//! - **Middleware** ([`middleware`]): process-wide named channels binding
//!   exactly one receiver each, isolating wire protocols from engine logic.
//!
//! - **Persistence** ([`persistence`]): whole-venue snapshots in a strict
//!   JSON format (unknown fields rejected, path-qualified parse errors),
//!   store/recover controller returning outcome codes.
//!
//! - **Runtime** ([`runtime`]): configuration, the phase/tick event loop
//!   and the [`runtime::TradingSystem`] facade wiring everything together.
//!
//! ## Concurrency Model
//!
//! Engines are never shared: each one is owned by its command queue and
//! drained by at most one worker at a time. Requests to the same engine are
//! processed and answered in submission order; requests to different
//! engines are independent. The catalogue is immutable after startup and
//! read concurrently without synchronisation.
//!
//! ## Example
//!
//! ```no_run
//! use venue_core_rs::prelude::*;
//! use venue_core_rs::domain::{
//!     Currency, InstrumentId, MaxQuantity, MinQuantity, PriceTick, QuantityTick,
//!     SecurityExchange, SecurityIdentifiers, SecurityType, Symbol,
//! };
//!
//! let instrument = Instrument {
//!     instrument_id: InstrumentId::new(0),
//!     symbol: Symbol::from("AAPL"),
//!     security_type: SecurityType::CommonStock,
//!     price_currency: Currency::from("USD"),
//!     base_currency: Currency::from("USD"),
//!     security_exchange: SecurityExchange::from("XSIM"),
//!     identifiers: SecurityIdentifiers::default(),
//!     party_id: None,
//!     party_role: None,
//!     price_tick: PriceTick::new(0.01),
//!     quantity_tick: QuantityTick::new(1.0),
//!     min_quantity: MinQuantity::new(1.0),
//!     max_quantity: MaxQuantity::new(1_000_000.0),
//! };
//!
//! let system = TradingSystem::start(vec![instrument], SimulationConfig::from_env())
//!     .expect("catalogue build");
//! // Protocol adapters now bind the trading-reply channel and submit
//! // requests through the middleware trading-request channel.
//! system.shutdown();
//! ```

pub mod book;
pub mod catalogue;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod middleware;
pub mod persistence;
pub mod protocol;
pub mod runtime;

pub mod prelude;
pub mod utils;

pub use book::{BookError, LimitOrder, OrderBook, Trade};
pub use catalogue::{CatalogueError, InstrumentCatalogue, ResolutionError};
pub use engine::{DisconnectPolicy, EngineConfig, MatchingEngine, PhaseTransition, Tick};
pub use execution::{EngineScheduler, ExecutionSystem, QueueConfig, QueueError};
pub use middleware::ChannelError;
pub use persistence::{
    JsonMarketStateSerializer, MarketStateSerializer, PersistenceConfig, PersistenceController,
    RecoverMarketState, Snapshot, StoreMarketState,
};
pub use protocol::ClientNotification;
pub use runtime::{SimulationConfig, TradingSystem};
