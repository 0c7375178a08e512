//! Reporters
//!
//! [`TracingReporter`] writes every notification and lifecycle marker as a
//! `tracing` event and feeds the metrics counters. [`RecordingReporter`]
//! keeps everything in memory for assertions.

use crate::application::ports::{Notification, Reporter};
use crate::domain::subscription::{SubscriptionKind, SubscriptionOutcome, SubscriptionState};
use crate::infrastructure::metrics;

/// How notifications are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per message, in `Debug` form.
    #[default]
    Debug,
    /// The agent CLI's multi-line layout.
    Pretty,
}

/// Reports through `tracing` at `info`, terminal failures at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter {
    format: OutputFormat,
}

impl TracingReporter {
    /// Create a reporter using `format` for notifications.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Reporter for TracingReporter {
    fn notification(&self, kind: SubscriptionKind, sequence: u64, message: &dyn Notification) {
        metrics::record_message_received(kind);
        match self.format {
            OutputFormat::Debug => {
                tracing::info!(subscription = kind.as_str(), sequence, "{message:?}");
            }
            OutputFormat::Pretty => {
                tracing::info!(
                    subscription = kind.as_str(),
                    sequence,
                    "\n{}",
                    message.render_pretty()
                );
            }
        }
    }

    fn transition(&self, kind: SubscriptionKind, state: SubscriptionState) {
        match state {
            SubscriptionState::Connecting => {
                tracing::info!(subscription = kind.as_str(), "{} connecting", kind.display_name());
            }
            SubscriptionState::Streaming => {
                tracing::info!(subscription = kind.as_str(), "{} started", kind.display_name());
            }
            _ => tracing::debug!(
                subscription = kind.as_str(),
                state = state.as_str(),
                "Subscription state changed"
            ),
        }
    }

    fn finished(&self, kind: SubscriptionKind, outcome: &SubscriptionOutcome) {
        metrics::record_subscription_finished(kind, outcome);
        match outcome {
            SubscriptionOutcome::Completed { received } => tracing::info!(
                subscription = kind.as_str(),
                received,
                "{} completed",
                kind.display_name()
            ),
            SubscriptionOutcome::Cancelled { received } => tracing::info!(
                subscription = kind.as_str(),
                received,
                "{} cancelled",
                kind.display_name()
            ),
            SubscriptionOutcome::Failed { received, error } => tracing::error!(
                subscription = kind.as_str(),
                received,
                error_kind = error.kind_str(),
                error = %error,
                "{} failed",
                kind.display_name()
            ),
        }
    }
}

// =============================================================================
// Recording Reporter
// =============================================================================

/// One thing a [`RecordingReporter`] was told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    /// A notification, kept in one-line `Debug` form.
    Notification {
        /// Subscription kind.
        kind: SubscriptionKind,
        /// 1-based sequence number.
        sequence: u64,
        /// `Debug` rendering of the message.
        debug: String,
    },
    /// A state change.
    Transition {
        /// Subscription kind.
        kind: SubscriptionKind,
        /// New state.
        state: SubscriptionState,
    },
    /// The terminal outcome.
    Finished {
        /// Subscription kind.
        kind: SubscriptionKind,
        /// Terminal state.
        state: SubscriptionState,
        /// Messages received.
        received: u64,
        /// Error text for failures.
        error: Option<String>,
    },
}

/// Reporter that records everything in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: parking_lot::Mutex<Vec<ReportEntry>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().clone()
    }

    /// `Debug` renderings of the notifications, in order.
    #[must_use]
    pub fn notification_debugs(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                ReportEntry::Notification { debug, .. } => Some(debug.clone()),
                _ => None,
            })
            .collect()
    }

    /// States reported through `transition`, in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<SubscriptionState> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                ReportEntry::Transition { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal outcomes reported.
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| matches!(entry, ReportEntry::Finished { .. }))
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn notification(&self, kind: SubscriptionKind, sequence: u64, message: &dyn Notification) {
        self.entries.lock().push(ReportEntry::Notification {
            kind,
            sequence,
            debug: format!("{message:?}"),
        });
    }

    fn transition(&self, kind: SubscriptionKind, state: SubscriptionState) {
        self.entries
            .lock()
            .push(ReportEntry::Transition { kind, state });
    }

    fn finished(&self, kind: SubscriptionKind, outcome: &SubscriptionOutcome) {
        self.entries.lock().push(ReportEntry::Finished {
            kind,
            state: outcome.state(),
            received: outcome.received(),
            error: outcome.error().map(ToString::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SubscriptionError;

    #[derive(Debug)]
    struct Line(u32);

    impl Notification for Line {}

    #[test]
    fn recorder_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.transition(SubscriptionKind::Events, SubscriptionState::Streaming);
        reporter.notification(SubscriptionKind::Events, 1, &Line(7));
        reporter.finished(
            SubscriptionKind::Events,
            &SubscriptionOutcome::Completed { received: 1 },
        );

        assert_eq!(
            reporter.entries(),
            vec![
                ReportEntry::Transition {
                    kind: SubscriptionKind::Events,
                    state: SubscriptionState::Streaming,
                },
                ReportEntry::Notification {
                    kind: SubscriptionKind::Events,
                    sequence: 1,
                    debug: "Line(7)".to_string(),
                },
                ReportEntry::Finished {
                    kind: SubscriptionKind::Events,
                    state: SubscriptionState::Completed,
                    received: 1,
                    error: None,
                },
            ]
        );
        assert_eq!(reporter.finished_count(), 1);
    }

    #[test]
    fn recorder_keeps_failure_text() {
        let reporter = RecordingReporter::new();
        reporter.finished(
            SubscriptionKind::GpuWatch,
            &SubscriptionOutcome::Failed {
                received: 0,
                error: SubscriptionError::TaskTerminated("panicked".to_string()),
            },
        );

        match &reporter.entries()[0] {
            ReportEntry::Finished { state, error, .. } => {
                assert_eq!(*state, SubscriptionState::Failed);
                assert_eq!(
                    error.as_deref(),
                    Some("subscription task terminated: panicked")
                );
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn tracing_reporter_without_subscriber_is_silent() {
        let reporter = TracingReporter::new(OutputFormat::Pretty);
        reporter.transition(SubscriptionKind::GpuWatch, SubscriptionState::Connecting);
        reporter.notification(SubscriptionKind::GpuWatch, 1, &Line(1));
        reporter.finished(
            SubscriptionKind::GpuWatch,
            &SubscriptionOutcome::Cancelled { received: 1 },
        );
    }
}
