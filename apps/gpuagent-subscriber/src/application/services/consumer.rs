//! Stream Consumer
//!
//! Drains an open notification stream, reporting each message exactly once
//! and in arrival order. The loop has no message limit and no timeout of
//! its own; it ends when the agent closes the stream, the transport fails,
//! or cancellation is requested.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::status::SubscriptionStatus;
use crate::application::ports::{Notification, NotificationStream, Reporter};
use crate::domain::error::SubscriptionError;

/// Why a drain ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// The agent closed the stream.
    Closed,
    /// Cancellation was requested.
    Cancelled,
}

/// Pulls messages off a stream and hands them to a reporter.
pub struct StreamConsumer<'a> {
    reporter: &'a dyn Reporter,
    status: &'a SubscriptionStatus,
}

impl<'a> StreamConsumer<'a> {
    /// Create a consumer that reports through `reporter` and counts into
    /// `status`.
    #[must_use]
    pub fn new(reporter: &'a dyn Reporter, status: &'a SubscriptionStatus) -> Self {
        Self { reporter, status }
    }

    /// Drain `stream` until it closes, fails, or `cancel` fires.
    ///
    /// Cancellation wins over a message that is ready at the same instant.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::StreamInterrupted` when the stream yields
    /// a transport error. The stream is dropped and never reopened.
    pub async fn drain<M: Notification>(
        &self,
        mut stream: NotificationStream<M>,
        cancel: &CancellationToken,
    ) -> Result<DrainEnd, SubscriptionError> {
        let kind = self.status.kind();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!(subscription = kind.as_str(), "Drain cancelled");
                    return Ok(DrainEnd::Cancelled);
                }
                next = stream.next() => match next {
                    Some(Ok(message)) => {
                        let sequence = self.status.record_message();
                        self.reporter.notification(kind, sequence, &message);
                    }
                    Some(Err(status)) => {
                        return Err(SubscriptionError::interrupted(self.status.received(), &status));
                    }
                    None => {
                        tracing::debug!(subscription = kind.as_str(), "Stream closed by agent");
                        return Ok(DrainEnd::Closed);
                    }
                }
            }
        }
    }
}
