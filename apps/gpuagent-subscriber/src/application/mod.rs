//! Application Layer - Ports and the subscription services built on them.

/// Port interfaces for the channel and the reporter.
pub mod ports;

/// Subscription services.
pub mod services;
