//! Top-level wiring: catalogue, engines, scheduler, channels, persistence
//! and the event loop assembled into one trading system.

mod config;
mod events;

pub use config::{ENV_PERSISTENCE_ENABLED, ENV_PERSISTENCE_FILE_PATH, SimulationConfig};
pub use events::PhaseEventLoop;

use crate::catalogue::{CatalogueError, InstrumentCatalogue};
use crate::domain::{Instrument, MarketPhase, TradingPhase, TradingStatus};
use crate::engine::{MatchingEngine, PhaseTransition};
use crate::execution::{ChannelReplyPublisher, EngineScheduler, ExecutionSystem};
use crate::middleware;
use crate::persistence::{
    JsonMarketStateSerializer, PersistenceController, RecoverResult, StoreMarketState,
};
use std::sync::{Arc, Mutex};
use tracing::info;

/// A running simulator core: one engine per catalogue instrument behind the
/// middleware channels.
///
/// `start` binds the trading-request and trading-session-event channels to
/// the execution system; protocol adapters bind the trading-reply channel
/// themselves before traffic starts.
pub struct TradingSystem {
    catalogue: Arc<InstrumentCatalogue>,
    execution: Arc<ExecutionSystem>,
    scheduler: Arc<EngineScheduler>,
    persistence: PersistenceController,
    event_loop: Mutex<Option<PhaseEventLoop>>,
}

impl TradingSystem {
    /// Builds the catalogue, spins up the engines and the worker pool,
    /// binds the ingress channels and starts the event loop.
    pub fn start(
        instruments: Vec<Instrument>,
        config: SimulationConfig,
    ) -> Result<Arc<Self>, CatalogueError> {
        let catalogue = Arc::new(InstrumentCatalogue::build(instruments)?);
        let engines: Vec<MatchingEngine> = catalogue
            .instruments()
            .map(|instrument| MatchingEngine::new(instrument.clone(), config.engine))
            .collect();
        let scheduler =
            EngineScheduler::start(engines, Arc::new(ChannelReplyPublisher), config.queue);
        let execution =
            Arc::new(ExecutionSystem::new(Arc::clone(&catalogue), Arc::clone(&scheduler)));

        middleware::bind_trading_request_receiver(execution.clone());
        middleware::bind_trading_session_event_receiver(execution.clone());

        let persistence = PersistenceController::new(
            config.persistence,
            config.venue_id.clone(),
            Box::new(JsonMarketStateSerializer::new()),
        );
        let event_loop = PhaseEventLoop::start(Arc::clone(&execution), config.tick_interval);

        info!(venue = %config.venue_id, instruments = catalogue.len(), "trading system started");
        Ok(Arc::new(Self {
            catalogue,
            execution,
            scheduler,
            persistence,
            event_loop: Mutex::new(Some(event_loop)),
        }))
    }

    #[must_use]
    pub fn catalogue(&self) -> &InstrumentCatalogue {
        &self.catalogue
    }

    /// Stores the market state of every engine; returns the outcome code.
    pub fn store_market_state(&self) -> StoreMarketState {
        self.persistence.store(self.execution.as_ref())
    }

    /// Recovers the market state from the persistence file.
    pub fn recover_market_state(&self) -> RecoverResult {
        self.persistence.recover(self.execution.as_ref())
    }

    /// Halts trading on every instrument; books are preserved.
    pub fn halt(&self) {
        self.set_phase(MarketPhase::new(TradingPhase::Open, TradingStatus::Halt));
    }

    /// Resumes continuous trading on every instrument.
    pub fn resume(&self) {
        self.set_phase(MarketPhase::open());
    }

    /// Applies an administrative phase transition to every engine.
    pub fn set_phase(&self, phase: MarketPhase) {
        self.execution.broadcast_phase_transition(PhaseTransition { phase });
    }

    /// Unbinds the channels, stops the event loop and joins the workers.
    pub fn shutdown(&self) {
        middleware::unbind_trading_request_receiver();
        middleware::unbind_trading_session_event_receiver();
        if let Some(mut event_loop) = self.event_loop.lock().expect("event loop lock").take() {
            event_loop.stop();
        }
        self.scheduler.shutdown();
        info!("trading system stopped");
    }
}
