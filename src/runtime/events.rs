//! The single-threaded phase/tick event loop.

use crate::engine::Tick;
use crate::execution::ExecutionSystem;
use crossbeam::channel::{Sender, bounded};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

/// Emits `Tick` events into every engine at a fixed interval.
///
/// Events are enqueued through the normal command path; no engine is ever
/// invoked from the loop thread directly.
pub struct PhaseEventLoop {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PhaseEventLoop {
    /// Starts the timer thread.
    #[must_use]
    pub fn start(execution: Arc<ExecutionSystem>, interval: Duration) -> Self {
        let (stop, stop_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("phase-tick-loop".to_string())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "event loop started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(crossbeam::channel::RecvTimeoutError::Timeout) => {
                            execution.broadcast_tick(Tick::at(crate::utils::now_micros()));
                        }
                        _ => break,
                    }
                }
                info!("event loop stopped");
            })
            .expect("spawning the event loop thread");
        Self { stop, handle: Some(handle) }
    }

    /// Signals the loop to exit and joins its thread.
    pub fn stop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PhaseEventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
