//! Prelude module that re-exports the commonly used types.
//!
//! ```rust
//! use venue_core_rs::prelude::*;
//! ```

// Domain model
pub use crate::domain::{
    Instrument, InstrumentDescriptor, MarketPhase, OrderId, OrderStatus, OrderType, Party, Price,
    Quantity, Session, Side, TimeInForce, TradingPhase, TradingStatus,
};

// Order book
pub use crate::book::{BookError, LimitOrder, OrderBook, OrderModification, Trade};

// Engine
pub use crate::engine::{DisconnectPolicy, EngineConfig, MatchingEngine, PhaseTransition, Tick};

// Catalogue and routing
pub use crate::catalogue::{InstrumentCatalogue, ResolutionError};
pub use crate::execution::{EngineScheduler, ExecutionSystem, QueueConfig};

// Protocol records
pub use crate::protocol::{
    ClientNotification, ExecutionReport, MarketDataRequest, OrderCancellationRequest,
    OrderModificationRequest, OrderPlacementRequest, SecurityStatusRequest,
    SessionTerminatedEvent,
};

// Middleware channels
pub use crate::middleware::{
    ChannelError, TradingReplyReceiver, TradingRequestReceiver, TradingSessionEventReceiver,
};

// Persistence
pub use crate::persistence::{
    JsonMarketStateSerializer, PersistenceConfig, PersistenceController, RecoverMarketState,
    Snapshot, StoreMarketState,
};

// Runtime
pub use crate::runtime::{SimulationConfig, TradingSystem};
