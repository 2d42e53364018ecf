//! Request routing, per-engine command queues and the worker pool.

mod commands;
mod queue;
mod reject;
mod system;

pub use commands::Command;
pub use queue::{ChannelReplyPublisher, EngineScheduler, QueueConfig, QueueError, ReplyPublisher};
pub use reject::{RejectNotifier, next_reject_order_id};
pub use system::ExecutionSystem;
