//! Market-state snapshot, serialisation and the persistence controller.

mod controller;
mod json;
mod serializer;
mod state;

pub use controller::{
    MarketStateExecutor, PersistenceConfig, PersistenceController, RecoverMarketState,
    RecoverResult, StoreMarketState,
};
pub use serializer::{JsonMarketStateSerializer, MarketStateSerializer, SerializerError};
pub use state::{InstrumentInfo, InstrumentState, OrderBookState, Snapshot};
