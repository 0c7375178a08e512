//! Subscription Runner
//!
//! Drives one subscription through its whole lifecycle:
//! filter build → channel open → drain, reporting every state change and
//! exactly one terminal outcome.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::consumer::{DrainEnd, StreamConsumer};
use super::status::SubscriptionStatus;
use crate::application::ports::{Reporter, SubscriptionChannel};
use crate::domain::error::SubscriptionError;
use crate::domain::filter::{FilterBuilder, FilterCriteria};
use crate::domain::subscription::{SubscriptionKind, SubscriptionOutcome, SubscriptionState};

/// One subscription attempt, ready to run.
pub struct SubscriptionRunner<C> {
    channel: C,
    criteria: FilterCriteria,
    reporter: Arc<dyn Reporter>,
    status: Arc<SubscriptionStatus>,
}

impl<C: SubscriptionChannel> SubscriptionRunner<C> {
    /// Create a runner for `channel` with unvalidated `criteria`.
    #[must_use]
    pub fn new(channel: C, criteria: FilterCriteria, reporter: Arc<dyn Reporter>) -> Self {
        let status = Arc::new(SubscriptionStatus::new(channel.kind()));
        Self {
            channel,
            criteria,
            reporter,
            status,
        }
    }

    /// Shared status, readable while the runner is in flight.
    #[must_use]
    pub fn status(&self) -> Arc<SubscriptionStatus> {
        Arc::clone(&self.status)
    }

    /// Reporter the runner writes to.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn Reporter> {
        Arc::clone(&self.reporter)
    }

    /// Run until the stream closes, fails, or `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> SubscriptionOutcome {
        let outcome = self.execute(&cancel).await;
        self.reporter.finished(self.kind(), &outcome);
        outcome
    }

    async fn execute(&self, cancel: &CancellationToken) -> SubscriptionOutcome {
        if cancel.is_cancelled() {
            return self.cancelled();
        }

        let filter = match FilterBuilder::build(self.kind(), &self.criteria) {
            Ok(filter) => filter,
            Err(e) => return self.failed(e.into()),
        };
        tracing::debug!(
            subscription = self.kind().as_str(),
            event_type_ids = ?filter.event_type_ids,
            entity_ids = filter.entity_ids.len(),
            "Filter built"
        );

        self.enter(SubscriptionState::Connecting);
        let stream = tokio::select! {
            biased;
            () = cancel.cancelled() => return self.cancelled(),
            opened = self.channel.open(filter) => match opened {
                Ok(stream) => stream,
                Err(e) => return self.failed(e),
            },
        };

        self.enter(SubscriptionState::Streaming);
        let consumer = StreamConsumer::new(self.reporter.as_ref(), &self.status);
        match consumer.drain(stream, cancel).await {
            Ok(DrainEnd::Closed) => {
                self.enter(SubscriptionState::Completed);
                SubscriptionOutcome::Completed {
                    received: self.status.received(),
                }
            }
            Ok(DrainEnd::Cancelled) => self.cancelled(),
            Err(e) => self.failed(e),
        }
    }

    fn kind(&self) -> SubscriptionKind {
        self.status.kind()
    }

    fn enter(&self, state: SubscriptionState) {
        if self.status.transition(state) {
            self.reporter.transition(self.kind(), state);
        }
    }

    fn cancelled(&self) -> SubscriptionOutcome {
        self.enter(SubscriptionState::Cancelled);
        SubscriptionOutcome::Cancelled {
            received: self.status.received(),
        }
    }

    fn failed(&self, error: SubscriptionError) -> SubscriptionOutcome {
        if self.status.fail(&error) {
            self.reporter.transition(self.kind(), SubscriptionState::Failed);
        }
        SubscriptionOutcome::Failed {
            received: self.status.received(),
            error,
        }
    }
}
