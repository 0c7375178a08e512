//! Subscription Task
//!
//! Runs a [`SubscriptionRunner`] on a background tokio task and hands back
//! a handle for cancelling and joining it.
//!
//! The task is detached from the caller: dropping the handle does not stop
//! it, and process exit does not wait for it. Callers that want a graceful
//! stop cancel first and then join.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::runner::SubscriptionRunner;
use super::status::SubscriptionStatus;
use crate::application::ports::{Reporter, SubscriptionChannel};
use crate::domain::error::SubscriptionError;
use crate::domain::subscription::SubscriptionOutcome;

/// Options for a spawned subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOptions {
    /// Cancel the subscription after this long. `None` runs until the stream
    /// ends. The timer lives on the subscription's own task and ends with it.
    pub deadline: Option<Duration>,
}

/// Spawns subscriptions onto the tokio runtime.
pub struct SubscriptionTask;

impl SubscriptionTask {
    /// Start `runner` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C>(runner: SubscriptionRunner<C>, options: TaskOptions) -> SubscriptionHandle
    where
        C: SubscriptionChannel + 'static,
    {
        let cancel = CancellationToken::new();
        let status = runner.status();
        let reporter = runner.reporter();
        let kind = status.kind();

        let task_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            let run = runner.run(task_cancel.clone());
            tokio::pin!(run);

            let Some(deadline) = options.deadline else {
                return run.await;
            };
            tokio::select! {
                outcome = &mut run => outcome,
                () = tokio::time::sleep(deadline) => {
                    tracing::info!(
                        subscription = kind.as_str(),
                        deadline_secs = deadline.as_secs_f64(),
                        "Subscription deadline reached, cancelling"
                    );
                    task_cancel.cancel();
                    run.await
                }
            }
        });

        tracing::debug!(subscription = kind.as_str(), "Subscription task spawned");

        SubscriptionHandle {
            join,
            cancel,
            status,
            reporter,
        }
    }
}

/// Handle to a running subscription task.
pub struct SubscriptionHandle {
    join: JoinHandle<SubscriptionOutcome>,
    cancel: CancellationToken,
    status: Arc<SubscriptionStatus>,
    reporter: Arc<dyn Reporter>,
}

impl SubscriptionHandle {
    /// Request cancellation. The task ends at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this subscription.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Live status of the subscription.
    #[must_use]
    pub fn status(&self) -> Arc<SubscriptionStatus> {
        Arc::clone(&self.status)
    }

    /// Check whether the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to end.
    ///
    /// A panicked or aborted task is reported as `Failed` with
    /// `SubscriptionError::TaskTerminated`.
    pub async fn join(mut self) -> SubscriptionOutcome {
        let joined = (&mut self.join).await;
        self.settle(joined)
    }

    /// Wait for the task to end, cancelling it first if `shutdown` resolves.
    pub async fn join_or_cancel_on<F>(mut self, shutdown: F) -> SubscriptionOutcome
    where
        F: Future<Output = ()>,
    {
        let joined = tokio::select! {
            joined = &mut self.join => joined,
            () = shutdown => {
                self.cancel.cancel();
                (&mut self.join).await
            }
        };
        self.settle(joined)
    }

    fn settle(&self, joined: Result<SubscriptionOutcome, JoinError>) -> SubscriptionOutcome {
        match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = SubscriptionError::TaskTerminated(e.to_string());
                self.status.fail(&error);
                let outcome = SubscriptionOutcome::Failed {
                    received: self.status.received(),
                    error,
                };
                self.reporter.finished(self.status.kind(), &outcome);
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use tonic::Status;

    use super::*;
    use crate::application::services::testing::{HangingChannel, MockChannel, Note, note_stream};
    use crate::domain::filter::FilterCriteria;
    use crate::domain::subscription::{SubscriptionKind, SubscriptionState};
    use crate::infrastructure::reporting::RecordingReporter;

    const GPU: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn pending_channel() -> MockChannel {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| Ok(Box::pin(stream::pending::<Result<Note, Status>>())));
        channel
    }

    fn spawn(
        channel: MockChannel,
        options: TaskOptions,
    ) -> (SubscriptionHandle, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::new());
        let runner =
            SubscriptionRunner::new(channel, FilterCriteria::gpu_watch(GPU), reporter.clone());
        (SubscriptionTask::spawn(runner, options), reporter)
    }

    #[tokio::test]
    async fn join_returns_completed_outcome() {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| Ok(note_stream(vec![Ok(Note("W1")), Ok(Note("W2"))])));

        let (handle, reporter) = spawn(channel, TaskOptions::default());
        let status = handle.status();
        let outcome = handle.join().await;

        assert!(matches!(outcome, SubscriptionOutcome::Completed { received: 2 }));
        assert_eq!(status.state(), SubscriptionState::Completed);
        assert_eq!(reporter.finished_count(), 1);
    }

    #[tokio::test]
    async fn cancel_then_join_is_cancelled() {
        let (handle, reporter) = spawn(pending_channel(), TaskOptions::default());
        let status = handle.status();

        while status.state() != SubscriptionState::Streaming {
            tokio::task::yield_now().await;
        }
        handle.cancel();
        let outcome = handle.join().await;

        assert!(matches!(outcome, SubscriptionOutcome::Cancelled { .. }));
        assert_eq!(status.state(), SubscriptionState::Cancelled);
        assert_eq!(reporter.finished_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_the_subscription() {
        let (handle, _reporter) = spawn(
            pending_channel(),
            TaskOptions {
                deadline: Some(Duration::from_secs(30)),
            },
        );
        let token = handle.cancellation_token();

        let outcome = handle.join().await;

        assert!(matches!(outcome, SubscriptionOutcome::Cancelled { received: 0 }));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_future_cancels_and_joins() {
        let (handle, _reporter) = spawn(pending_channel(), TaskOptions::default());
        let status = handle.status();

        let outcome = handle
            .join_or_cancel_on(async {
                while status.state() != SubscriptionState::Streaming {
                    tokio::task::yield_now().await;
                }
            })
            .await;

        assert!(matches!(outcome, SubscriptionOutcome::Cancelled { .. }));
    }

    #[tokio::test]
    async fn shutdown_that_never_fires_waits_for_completion() {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| Ok(note_stream(vec![Ok(Note("W1"))])));

        let (handle, _reporter) = spawn(channel, TaskOptions::default());
        let outcome = handle.join_or_cancel_on(std::future::pending()).await;

        assert!(matches!(outcome, SubscriptionOutcome::Completed { received: 1 }));
    }

    #[tokio::test]
    async fn panicking_channel_maps_to_task_terminated() {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| panic!("channel exploded"));

        let (handle, reporter) = spawn(channel, TaskOptions::default());
        let status = handle.status();
        let outcome = handle.join().await;

        assert!(matches!(
            outcome.error(),
            Some(SubscriptionError::TaskTerminated(_))
        ));
        assert_eq!(status.state(), SubscriptionState::Failed);
        assert_eq!(reporter.finished_count(), 1);
    }

    #[tokio::test]
    async fn is_finished_once_the_stream_closes() {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| Ok(note_stream(vec![])));

        let (handle, _reporter) = spawn(channel, TaskOptions::default());
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            handle.join().await,
            SubscriptionOutcome::Completed { received: 0 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_while_connecting() {
        let reporter = Arc::new(RecordingReporter::new());
        let runner = SubscriptionRunner::new(
            HangingChannel(SubscriptionKind::GpuWatch),
            FilterCriteria::gpu_watch(GPU),
            reporter.clone(),
        );
        let handle = SubscriptionTask::spawn(
            runner,
            TaskOptions {
                deadline: Some(Duration::from_secs(5)),
            },
        );

        let outcome = handle.join().await;

        assert!(matches!(outcome, SubscriptionOutcome::Cancelled { received: 0 }));
        assert_eq!(
            reporter.transitions(),
            vec![SubscriptionState::Connecting, SubscriptionState::Cancelled]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn panicked_task_leaves_no_deadline_timer_behind() {
        let mut channel = MockChannel::new();
        channel.expect_kind().return_const(SubscriptionKind::GpuWatch);
        channel
            .expect_open()
            .times(1)
            .returning(|_| panic!("channel exploded"));

        let (handle, _reporter) = spawn(
            channel,
            TaskOptions {
                deadline: Some(Duration::from_secs(30)),
            },
        );
        let token = handle.cancellation_token();

        let outcome = handle.join().await;
        assert!(matches!(
            outcome.error(),
            Some(SubscriptionError::TaskTerminated(_))
        ));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!token.is_cancelled());
    }
}
