//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports plus the ambient
//! process concerns the binaries wire together.

/// Command-line, connection settings and `.env` loading.
pub mod config;

/// Tonic channels for the event and GPU watch services.
pub mod grpc;

/// Shared wiring for the command-line binaries.
pub mod launcher;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing and recording reporters.
pub mod reporting;

/// Tracing subscriber and OpenTelemetry setup.
pub mod telemetry;
