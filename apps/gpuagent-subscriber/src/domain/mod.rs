//! Domain Layer - Filters, identifiers and the subscription lifecycle.
//!
//! Nothing in this layer performs I/O.

/// Subscription error taxonomy.
pub mod error;

/// Filter criteria and the filter builder.
pub mod filter;

/// 16-byte entity identifiers.
pub mod identifier;

/// Subscription kinds, states and outcomes.
pub mod subscription;
