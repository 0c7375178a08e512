//! Subscription Errors
//!
//! Every error here is terminal for the current invocation. Nothing is
//! retried automatically.

use tonic::Code;

/// A filter criterion that could not be turned into a request field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// An event-type token is not an integer.
    #[error("invalid event type id {token:?}: {reason}")]
    InvalidEventTypeId {
        /// Offending token, as supplied.
        token: String,
        /// Parser message.
        reason: String,
    },

    /// An entity token is not UUID text.
    #[error("invalid entity id {token:?}: {reason}")]
    InvalidEntityId {
        /// Offending token, as supplied.
        token: String,
        /// Parser message.
        reason: String,
    },

    /// A criterion required by this subscription kind was not supplied.
    #[error("missing required criterion: {0}")]
    MissingCriterion(&'static str),
}

/// Errors that end a subscription attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubscriptionError {
    /// Filter construction failed before any network activity.
    #[error("invalid filter input: {0}")]
    InvalidFilterInput(#[from] FilterError),

    /// Connection or call initiation failed.
    #[error("channel to {endpoint} unavailable: {reason}")]
    ChannelUnavailable {
        /// Endpoint URI the channel targeted.
        endpoint: String,
        /// Transport or status message.
        reason: String,
    },

    /// The open stream failed with a transport error.
    #[error("stream interrupted after {received} messages ({code:?}): {message}")]
    StreamInterrupted {
        /// Messages received before the failure.
        received: u64,
        /// gRPC status code of the failure.
        code: Code,
        /// Status message.
        message: String,
    },

    /// The background task panicked or was aborted.
    #[error("subscription task terminated: {0}")]
    TaskTerminated(String),
}

impl SubscriptionError {
    /// Build a `StreamInterrupted` error from a gRPC status.
    #[must_use]
    pub fn interrupted(received: u64, status: &tonic::Status) -> Self {
        Self::StreamInterrupted {
            received,
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    /// Short machine-friendly label, used for metrics and status output.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::InvalidFilterInput(_) => "invalid_filter_input",
            Self::ChannelUnavailable { .. } => "channel_unavailable",
            Self::StreamInterrupted { .. } => "stream_interrupted",
            Self::TaskTerminated(_) => "task_terminated",
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidFilterInput(_) => 2,
            Self::ChannelUnavailable { .. } => 3,
            Self::StreamInterrupted { .. } => 4,
            Self::TaskTerminated(_) => 1,
        }
    }
}
