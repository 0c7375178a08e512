//! Subscription Status Tracking
//!
//! Shared, lock-light view of a running subscription. The background task
//! writes it; the foreground (or anything holding the `Arc`) reads it.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::domain::error::SubscriptionError;
use crate::domain::subscription::{SubscriptionKind, SubscriptionState};

/// Point-in-time copy of a [`SubscriptionStatus`].
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Subscription kind.
    pub kind: SubscriptionKind,
    /// Current lifecycle state.
    pub state: SubscriptionState,
    /// Messages received so far.
    pub received: u64,
    /// When the most recent message arrived.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Error that moved the subscription to `Failed`, if any.
    pub error: Option<SubscriptionError>,
}

/// Live status of one subscription.
#[derive(Debug)]
pub struct SubscriptionStatus {
    kind: SubscriptionKind,
    state: parking_lot::RwLock<SubscriptionState>,
    received: AtomicU64,
    last_message_at: parking_lot::RwLock<Option<DateTime<Utc>>>,
    error: parking_lot::RwLock<Option<SubscriptionError>>,
}

impl SubscriptionStatus {
    /// Create a status in the `Idle` state.
    #[must_use]
    pub fn new(kind: SubscriptionKind) -> Self {
        Self {
            kind,
            state: parking_lot::RwLock::new(SubscriptionState::Idle),
            received: AtomicU64::new(0),
            last_message_at: parking_lot::RwLock::new(None),
            error: parking_lot::RwLock::new(None),
        }
    }

    /// Subscription kind.
    #[must_use]
    pub const fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    /// Move to `next` if the transition is legal.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn transition(&self, next: SubscriptionState) -> bool {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            tracing::warn!(
                subscription = self.kind.as_str(),
                from = state.as_str(),
                to = next.as_str(),
                "Ignoring illegal subscription state transition"
            );
            return false;
        }
        *state = next;
        true
    }

    /// Move to `Failed`, recording the error.
    pub fn fail(&self, error: &SubscriptionError) -> bool {
        if self.transition(SubscriptionState::Failed) {
            *self.error.write() = Some(error.clone());
            true
        } else {
            false
        }
    }

    /// Count a received message and return its 1-based sequence number.
    pub fn record_message(&self) -> u64 {
        *self.last_message_at.write() = Some(Utc::now());
        self.received.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        *self.state.read()
    }

    /// Get the number of messages received.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough copy for display.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            kind: self.kind,
            state: self.state(),
            received: self.received(),
            last_message_at: *self.last_message_at.read(),
            error: self.error.read().clone(),
        }
    }
}
