//! Subscription Lifecycle Types
//!
//! Each subscription moves through a small state machine:
//!
//! ```text
//! Idle ──► Connecting ──► Streaming ──► Completed
//!   │           │             │
//!   └───────────┴─────────────┴──────► Failed | Cancelled
//! ```
//!
//! `Completed` is reached only when the agent closes the stream cleanly.
//! `Failed` and `Cancelled` are terminal as well; a subscription is never
//! restarted from any terminal state.

use super::error::SubscriptionError;

// =============================================================================
// Subscription Kind
// =============================================================================

/// Which agent service a subscription targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// `EventSvc.EventSubscribe`: discrete GPU events.
    Events,
    /// `GPUWatchSvc.GPUWatchSubscribe`: watch object updates.
    GpuWatch,
}

impl SubscriptionKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::GpuWatch => "gpu_watch",
        }
    }

    /// Human-readable name for lifecycle markers.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Events => "Events subscription",
            Self::GpuWatch => "GPU watch subscription",
        }
    }
}

// =============================================================================
// Subscription State
// =============================================================================

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    /// Not started; the filter has not been built yet.
    #[default]
    Idle,
    /// Opening the channel and initiating the streaming call.
    Connecting,
    /// Draining the open stream.
    Streaming,
    /// The agent closed the stream cleanly.
    Completed,
    /// Filter, channel or stream error.
    Failed,
    /// Cancelled by the caller or by the deadline.
    Cancelled,
}

impl SubscriptionState {
    /// Check whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Idle => matches!(next, Self::Connecting | Self::Failed | Self::Cancelled),
            Self::Connecting => matches!(next, Self::Streaming | Self::Failed | Self::Cancelled),
            Self::Streaming => matches!(next, Self::Completed | Self::Failed | Self::Cancelled),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }

    /// Get the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// Subscription Outcome
// =============================================================================

/// How a subscription ended.
#[derive(Debug, Clone)]
pub enum SubscriptionOutcome {
    /// The agent closed the stream.
    Completed {
        /// Messages received.
        received: u64,
    },
    /// Cancellation was requested before the stream ended.
    Cancelled {
        /// Messages received.
        received: u64,
    },
    /// The subscription failed.
    Failed {
        /// Messages received before the failure.
        received: u64,
        /// What went wrong.
        error: SubscriptionError,
    },
}

impl SubscriptionOutcome {
    /// Terminal state matching this outcome.
    #[must_use]
    pub const fn state(&self) -> SubscriptionState {
        match self {
            Self::Completed { .. } => SubscriptionState::Completed,
            Self::Cancelled { .. } => SubscriptionState::Cancelled,
            Self::Failed { .. } => SubscriptionState::Failed,
        }
    }

    /// Number of messages received before the subscription ended.
    #[must_use]
    pub const fn received(&self) -> u64 {
        match self {
            Self::Completed { received }
            | Self::Cancelled { received }
            | Self::Failed { received, .. } => *received,
        }
    }

    /// The error, if the subscription failed.
    #[must_use]
    pub const fn error(&self) -> Option<&SubscriptionError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed { .. } | Self::Cancelled { .. } => 0,
            Self::Failed { error, .. } => error.exit_code(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::FilterError;

    const ALL: [SubscriptionState; 6] = [
        SubscriptionState::Idle,
        SubscriptionState::Connecting,
        SubscriptionState::Streaming,
        SubscriptionState::Completed,
        SubscriptionState::Failed,
        SubscriptionState::Cancelled,
    ];

    #[test]
    fn happy_path_transitions() {
        assert!(SubscriptionState::Idle.can_transition_to(SubscriptionState::Connecting));
        assert!(SubscriptionState::Connecting.can_transition_to(SubscriptionState::Streaming));
        assert!(SubscriptionState::Streaming.can_transition_to(SubscriptionState::Completed));
    }

    #[test]
    fn completed_only_from_streaming() {
        for state in ALL {
            let allowed = state.can_transition_to(SubscriptionState::Completed);
            assert_eq!(allowed, state == SubscriptionState::Streaming, "{state:?}");
        }
    }

    #[test]
    fn failure_reachable_from_every_live_state() {
        for state in ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(state.can_transition_to(SubscriptionState::Failed));
            assert!(state.can_transition_to(SubscriptionState::Cancelled));
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for state in ALL.into_iter().filter(SubscriptionState::is_terminal) {
            for next in ALL {
                assert!(!state.can_transition_to(next), "{state:?} -> {next:?}");
            }
        }
    }

    #[test]
    fn no_skipping_connecting() {
        assert!(!SubscriptionState::Idle.can_transition_to(SubscriptionState::Streaming));
        assert!(!SubscriptionState::Streaming.can_transition_to(SubscriptionState::Connecting));
    }

    #[test]
    fn outcome_accessors() {
        let done = SubscriptionOutcome::Completed { received: 3 };
        assert_eq!(done.state(), SubscriptionState::Completed);
        assert_eq!(done.received(), 3);
        assert!(done.error().is_none());
        assert_eq!(done.exit_code(), 0);

        let failed = SubscriptionOutcome::Failed {
            received: 0,
            error: FilterError::MissingCriterion("entity ids").into(),
        };
        assert_eq!(failed.state(), SubscriptionState::Failed);
        assert_eq!(failed.exit_code(), 2);

        let cancelled = SubscriptionOutcome::Cancelled { received: 9 };
        assert_eq!(cancelled.state(), SubscriptionState::Cancelled);
        assert_eq!(cancelled.exit_code(), 0);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(SubscriptionKind::Events.as_str(), "events");
        assert_eq!(SubscriptionKind::GpuWatch.as_str(), "gpu_watch");
        assert_eq!(
            SubscriptionKind::GpuWatch.display_name(),
            "GPU watch subscription"
        );
    }
}
