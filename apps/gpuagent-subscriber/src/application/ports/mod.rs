//! Port Interfaces
//!
//! Contracts between the subscription services and the outside world.
//!
//! ## Driven Ports (Outbound)
//!
//! - `SubscriptionChannel`: opens the streaming call against the agent
//! - `Reporter`: receives every notification and lifecycle marker
//!
//! The reporter is passed in explicitly rather than reached through a
//! process-wide logger, so services can be exercised with a recording
//! reporter in tests.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::error::SubscriptionError;
use crate::domain::filter::SubscriptionFilter;
use crate::domain::subscription::{SubscriptionKind, SubscriptionOutcome, SubscriptionState};

/// An open server stream of notifications.
pub type NotificationStream<M> = Pin<Box<dyn Stream<Item = Result<M, tonic::Status>> + Send>>;

/// One opaque unit pushed by the agent.
pub trait Notification: fmt::Debug + Send + 'static {
    /// Multi-line, human-oriented rendering.
    ///
    /// Defaults to the pretty `Debug` form.
    fn render_pretty(&self) -> String {
        format!("{self:#?}")
    }
}

/// Outbound connection that can open one subscription stream.
#[async_trait]
pub trait SubscriptionChannel: Send + Sync {
    /// Message type carried by the stream.
    type Message: Notification;

    /// Which agent service this channel talks to.
    fn kind(&self) -> SubscriptionKind;

    /// Connect and issue the streaming call carrying `filter`.
    ///
    /// Exactly one call is made; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::ChannelUnavailable` if the connection or
    /// call initiation fails.
    async fn open(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<NotificationStream<Self::Message>, SubscriptionError>;
}

/// Sink for everything a subscription has to say.
pub trait Reporter: Send + Sync {
    /// A notification arrived. `sequence` starts at 1.
    fn notification(&self, kind: SubscriptionKind, sequence: u64, message: &dyn Notification);

    /// The subscription moved to a new state.
    fn transition(&self, kind: SubscriptionKind, state: SubscriptionState);

    /// The subscription reached a terminal state.
    fn finished(&self, kind: SubscriptionKind, outcome: &SubscriptionOutcome);
}
