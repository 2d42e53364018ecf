//! Per-engine command queues drained by a shared worker pool.
//!
//! Every engine owns one bounded FIFO queue. A queue is drained by at most
//! one worker at a time, which is the only concurrency guarantee the engine
//! relies on. The pool size is `min(instruments, available parallelism)`
//! and workers draw ready engines from a shared run queue.

use crate::domain::InstrumentId;
use crate::engine::MatchingEngine;
use crate::execution::commands::Command;
use crate::protocol::ClientNotification;
use crossbeam::channel::{Receiver, Sender, unbounded};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

/// Queue sizing and backpressure settings.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Maximum commands a single engine queue holds before senders block.
    pub capacity: usize,
    /// How long an enqueue blocks on a full queue before failing.
    pub enqueue_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 1024, enqueue_timeout: Duration::from_secs(5) }
    }
}

/// Failure to enqueue a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The target queue stayed full for the whole enqueue timeout.
    #[error("the command queue of instrument {0} stayed full past the enqueue timeout")]
    Timeout(InstrumentId),
    /// The scheduler is shutting down.
    #[error("the command scheduler is shut down")]
    ShutDown,
}

/// Consumes the notification batches the workers produce.
pub trait ReplyPublisher: Send + Sync {
    fn publish_batch(&self, notifications: Vec<ClientNotification>);
}

/// Publishes every notification through the middleware trading-reply
/// channel; an unbound channel is reported, not swallowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelReplyPublisher;

impl ReplyPublisher for ChannelReplyPublisher {
    fn publish_batch(&self, notifications: Vec<ClientNotification>) {
        for notification in notifications {
            if let Err(cause) = crate::middleware::send_client_notification(notification) {
                error!(%cause, "dropping client notification");
            }
        }
    }
}

struct EngineSlot {
    instrument_id: InstrumentId,
    engine: Mutex<MatchingEngine>,
    queue: Mutex<VecDeque<Command>>,
    not_full: Condvar,
    /// True while the slot sits in the run queue or is being drained.
    scheduled: AtomicBool,
}

enum RunToken {
    Drain(InstrumentId),
    Stop,
}

/// The worker pool and the per-engine queues.
pub struct EngineScheduler {
    slots: DashMap<InstrumentId, Arc<EngineSlot>>,
    /// Instrument ids in catalogue order, for ordered broadcasts.
    order: Vec<InstrumentId>,
    run_queue: Sender<RunToken>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    config: QueueConfig,
}

impl EngineScheduler {
    /// Starts the worker pool over the given engines.
    #[must_use]
    pub fn start(
        engines: Vec<MatchingEngine>,
        publisher: Arc<dyn ReplyPublisher>,
        config: QueueConfig,
    ) -> Arc<Self> {
        let (run_queue, run_queue_rx) = unbounded();
        let slots = DashMap::new();
        let mut order = Vec::with_capacity(engines.len());
        for engine in engines {
            let instrument_id = engine.instrument().instrument_id;
            order.push(instrument_id);
            slots.insert(
                instrument_id,
                Arc::new(EngineSlot {
                    instrument_id,
                    engine: Mutex::new(engine),
                    queue: Mutex::new(VecDeque::new()),
                    not_full: Condvar::new(),
                    scheduled: AtomicBool::new(false),
                }),
            );
        }

        let available = std::thread::available_parallelism().map_or(1, |count| count.get());
        let worker_count = order.len().max(1).min(available);

        let scheduler = Arc::new(Self {
            slots,
            order,
            run_queue,
            workers: Mutex::new(Vec::new()),
            worker_count,
            config,
        });

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let scheduler = Arc::clone(&scheduler);
            let publisher = Arc::clone(&publisher);
            let run_queue_rx = run_queue_rx.clone();
            workers.push(
                std::thread::Builder::new()
                    .name(format!("engine-worker-{index}"))
                    .spawn(move || scheduler.worker_loop(&run_queue_rx, publisher.as_ref()))
                    .expect("spawning an engine worker thread"),
            );
        }
        *scheduler.workers.lock().expect("worker list lock poisoned") = workers;
        info!(workers = worker_count, engines = scheduler.order.len(), "engine scheduler started");
        scheduler
    }

    /// Instrument ids in catalogue order.
    #[must_use]
    pub fn instrument_order(&self) -> &[InstrumentId] {
        &self.order
    }

    /// Enqueues a command for one engine, blocking while the queue is full.
    ///
    /// Timeout expiry is a hard error to the caller; no command is ever
    /// silently dropped.
    pub fn enqueue(&self, instrument_id: InstrumentId, command: Command) -> Result<(), QueueError> {
        let slot = self
            .slots
            .get(&instrument_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(QueueError::ShutDown)?;

        trace!(instrument = instrument_id.value(), command = command.name(), "enqueueing");
        let deadline = Instant::now() + self.config.enqueue_timeout;
        let mut queue = slot.queue.lock().expect("queue lock poisoned");
        while queue.len() >= self.config.capacity {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
            else {
                return Err(QueueError::Timeout(instrument_id));
            };
            let (guard, wait) = slot
                .not_full
                .wait_timeout(queue, remaining)
                .expect("queue lock poisoned");
            queue = guard;
            if wait.timed_out() && queue.len() >= self.config.capacity {
                return Err(QueueError::Timeout(instrument_id));
            }
        }
        queue.push_back(command);
        drop(queue);

        self.schedule(&slot);
        Ok(())
    }

    /// Enqueues the same event-producing command on every engine in
    /// catalogue order.
    pub fn broadcast(
        &self,
        mut make_command: impl FnMut() -> Command,
    ) -> Result<(), QueueError> {
        for instrument_id in &self.order {
            self.enqueue(*instrument_id, make_command())?;
        }
        Ok(())
    }

    /// Stops the workers and joins them. Queued commands that were not yet
    /// drained are discarded.
    pub fn shutdown(&self) {
        for _ in 0..self.worker_count {
            let _ = self.run_queue.send(RunToken::Stop);
        }
        let workers = std::mem::take(&mut *self.workers.lock().expect("worker list lock poisoned"));
        for worker in workers {
            let _ = worker.join();
        }
        info!("engine scheduler stopped");
    }

    fn schedule(&self, slot: &Arc<EngineSlot>) {
        if !slot.scheduled.swap(true, Ordering::AcqRel) {
            let _ = self.run_queue.send(RunToken::Drain(slot.instrument_id));
        }
    }

    fn worker_loop(&self, run_queue: &Receiver<RunToken>, publisher: &dyn ReplyPublisher) {
        while let Ok(token) = run_queue.recv() {
            let instrument_id = match token {
                RunToken::Drain(instrument_id) => instrument_id,
                RunToken::Stop => break,
            };
            let Some(slot) = self.slots.get(&instrument_id).map(|entry| Arc::clone(entry.value()))
            else {
                continue;
            };
            self.drain(&slot, publisher);
        }
        debug!("engine worker exiting");
    }

    /// Drains one engine's queue to exhaustion. The claiming worker is the
    /// only one touching this engine until `scheduled` is released.
    fn drain(&self, slot: &Arc<EngineSlot>, publisher: &dyn ReplyPublisher) {
        loop {
            let command = {
                let mut queue = slot.queue.lock().expect("queue lock poisoned");
                let command = queue.pop_front();
                if command.is_some() {
                    slot.not_full.notify_one();
                }
                command
            };
            let Some(command) = command else { break };

            trace!(
                instrument = slot.instrument_id.value(),
                command = command.name(),
                "executing command"
            );
            let batch = {
                let mut engine = slot.engine.lock().expect("engine lock poisoned");
                command.execute(&mut engine)
            };
            if !batch.is_empty() {
                publisher.publish_batch(batch);
            }
        }

        slot.scheduled.store(false, Ordering::Release);
        // A sender may have pushed between the final pop and the release;
        // reclaim the slot if so.
        let pending = !slot.queue.lock().expect("queue lock poisoned").is_empty();
        if pending {
            self.schedule(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Currency, InstrumentDescriptor, MaxQuantity, MinQuantity, OrderType, Price, PriceTick,
        Quantity, QuantityTick, SecurityExchange, SecurityIdentifiers, SecurityType, Session,
        Side, Symbol, TimeInForce,
    };
    use crate::engine::EngineConfig;
    use crate::protocol::OrderPlacementRequest;
    use std::sync::Mutex as StdMutex;

    fn instrument(id: u32, symbol: &str) -> crate::domain::Instrument {
        crate::domain::Instrument {
            instrument_id: InstrumentId::new(id),
            symbol: Symbol::from(symbol),
            security_type: SecurityType::CommonStock,
            price_currency: Currency::from("USD"),
            base_currency: Currency::from("USD"),
            security_exchange: SecurityExchange::from("XSIM"),
            identifiers: SecurityIdentifiers::default(),
            party_id: None,
            party_role: None,
            price_tick: PriceTick::new(0.01),
            quantity_tick: QuantityTick::new(1.0),
            min_quantity: MinQuantity::new(1.0),
            max_quantity: MaxQuantity::new(1_000_000.0),
        }
    }

    #[derive(Default)]
    struct CollectingPublisher {
        batches: StdMutex<Vec<Vec<ClientNotification>>>,
    }

    impl ReplyPublisher for CollectingPublisher {
        fn publish_batch(&self, notifications: Vec<ClientNotification>) {
            self.batches.lock().unwrap().push(notifications);
        }
    }

    fn placement(symbol: &str, client_order_id: &str, side: Side, price: f64) -> Command {
        let mut request = OrderPlacementRequest::new(
            Session::fix("FIX.4.4", "CLIENT1", "VENUE"),
            InstrumentDescriptor::for_symbol(symbol),
        );
        request.client_order_id = Some(client_order_id.into());
        request.side = Some(side);
        request.order_type = Some(OrderType::Limit);
        request.order_price = Some(Price::new(price));
        request.quantity = Some(Quantity::new(100.0));
        request.time_in_force = Some(TimeInForce::GoodTillCancel);
        Command::PlaceOrder(request)
    }

    #[test]
    fn commands_on_one_engine_execute_in_submission_order() {
        let publisher = Arc::new(CollectingPublisher::default());
        let engines =
            vec![MatchingEngine::new(instrument(0, "AAPL"), EngineConfig::default())];
        let scheduler =
            EngineScheduler::start(engines, publisher.clone(), QueueConfig::default());

        for index in 0..20 {
            scheduler
                .enqueue(
                    InstrumentId::new(0),
                    placement("AAPL", &format!("c{index}"), Side::Buy, 10.00),
                )
                .unwrap();
        }
        // Confirmation batches must come back in submission order; poll
        // until the workers have drained everything.
        let deadline = Instant::now() + Duration::from_secs(5);
        while publisher.batches.lock().unwrap().len() < 20 {
            assert!(Instant::now() < deadline, "scheduler did not drain in time");
            std::thread::sleep(Duration::from_millis(5));
        }
        scheduler.shutdown();

        let batches = publisher.batches.lock().unwrap();
        let confirmed: Vec<u64> = batches
            .iter()
            .filter_map(|batch| match batch.first() {
                Some(ClientNotification::PlacementConfirmation(confirmation)) => {
                    Some(confirmation.venue_order_id.value())
                }
                _ => None,
            })
            .collect();
        let expected: Vec<u64> = (1..=20).collect();
        assert_eq!(confirmed, expected);
    }

    #[test]
    fn full_queue_times_out_instead_of_dropping() {
        let publisher = Arc::new(CollectingPublisher::default());
        // A scheduler with no workers would be better here; instead use a
        // tiny capacity and a long recover command to hold the worker.
        let engines =
            vec![MatchingEngine::new(instrument(0, "AAPL"), EngineConfig::default())];
        let config =
            QueueConfig { capacity: 1, enqueue_timeout: Duration::from_millis(50) };
        let scheduler = EngineScheduler::start(engines, publisher, config);
        scheduler.shutdown();

        // Workers are gone: the first command fills the queue, the second
        // must time out.
        scheduler.enqueue(InstrumentId::new(0), placement("AAPL", "a", Side::Buy, 10.0)).unwrap();
        let result =
            scheduler.enqueue(InstrumentId::new(0), placement("AAPL", "b", Side::Buy, 10.0));
        assert_eq!(result, Err(QueueError::Timeout(InstrumentId::new(0))));
    }

    #[test]
    fn unknown_instrument_cannot_be_enqueued() {
        let publisher = Arc::new(CollectingPublisher::default());
        let scheduler = EngineScheduler::start(Vec::new(), publisher, QueueConfig::default());
        let result =
            scheduler.enqueue(InstrumentId::new(9), placement("MISSING", "a", Side::Buy, 10.0));
        assert_eq!(result, Err(QueueError::ShutDown));
        scheduler.shutdown();
    }
}
