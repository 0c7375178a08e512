#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! GPU Agent Subscriber - Event and GPU Watch Stream Clients
//!
//! Diagnostic clients that open one server-streaming subscription against a
//! GPU agent and log every notification it pushes until the agent closes
//! the stream, the transport fails, or the caller cancels.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Filters, identifiers and the subscription lifecycle
//!   - `filter`: criteria text → validated subscription filter
//!   - `identifier`: 16-byte GPU / watch identifiers
//!   - `subscription`: kinds, states and outcomes
//!
//! - **Application**: Ports and the subscription pipeline
//!   - `ports`: `SubscriptionChannel`, `Reporter`, `Notification`
//!   - `services`: stream consumer, runner and background task
//!
//! - **Infrastructure**: Adapters and process plumbing
//!   - `grpc`: tonic channels for `EventSvc` and `GPUWatchSvc`
//!   - `reporting`: tracing and recording reporters
//!   - `config`: clap arguments, connection settings, `.env`
//!   - `metrics`, `telemetry`: Prometheus counters, tracing subscriber
//!
//! # Flow
//!
//! ```text
//! FilterBuilder ──► SubscriptionChannel::open ──► StreamConsumer::drain ──► Reporter
//!        └──────────── SubscriptionRunner (on a SubscriptionTask) ───────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Filters and lifecycle types with no I/O.
pub mod domain;

/// Application layer - Ports and subscription services.
pub mod application;

/// Infrastructure layer - gRPC adapters, reporting and configuration.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::error::{FilterError, SubscriptionError};
pub use domain::filter::{FilterBuilder, FilterCriteria, SubscriptionFilter};
pub use domain::identifier::EntityId;
pub use domain::subscription::{SubscriptionKind, SubscriptionOutcome, SubscriptionState};

// Application
pub use application::ports::{Notification, NotificationStream, Reporter, SubscriptionChannel};
pub use application::services::{
    StreamConsumer, SubscriptionHandle, SubscriptionRunner, SubscriptionStatus, SubscriptionTask,
    TaskOptions,
};

// Infrastructure
pub use infrastructure::config::{ConfigError, ConnectionSettings};
pub use infrastructure::grpc::{EventChannel, GpuWatchChannel, GrpcEndpoint};
pub use infrastructure::metrics::init_metrics;
pub use infrastructure::reporting::{OutputFormat, RecordingReporter, ReportEntry, TracingReporter};
