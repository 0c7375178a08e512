//! Application Services
//!
//! The subscription pipeline: status tracking, the stream consumer, the
//! lifecycle runner and the background task wrapper.

/// Draining an open stream.
pub mod consumer;

/// Lifecycle driver for one subscription.
pub mod runner;

/// Shared subscription status.
pub mod status;

/// Background execution with cancel and join.
pub mod task;

pub use consumer::{DrainEnd, StreamConsumer};
pub use runner::SubscriptionRunner;
pub use status::{StatusSnapshot, SubscriptionStatus};
pub use task::{SubscriptionHandle, SubscriptionTask, TaskOptions};
