//! Prometheus Metrics Module
//!
//! Counters for received messages and subscription outcomes. The counters
//! go through the `metrics` facade, so they are no-ops until a recorder is
//! installed with [`init_metrics`].

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::domain::subscription::{SubscriptionKind, SubscriptionOutcome};

const MESSAGES_RECEIVED: &str = "gpuagent_subscriber_messages_received_total";
const SUBSCRIPTIONS: &str = "gpuagent_subscriber_subscriptions_total";
const STREAM_ERRORS: &str = "gpuagent_subscriber_stream_errors_total";

static METRICS_ADDR: OnceLock<SocketAddr> = OnceLock::new();

/// Install the Prometheus recorder and serve `/metrics` on `port`.
///
/// Port 0 disables metrics and returns `Ok(None)`. Repeated calls return the
/// address bound by the first one.
///
/// # Errors
///
/// Returns the exporter's `BuildError` if the listener or the global
/// recorder cannot be installed.
pub fn init_metrics(port: u16) -> Result<Option<SocketAddr>, BuildError> {
    if port == 0 {
        return Ok(None);
    }
    if let Some(addr) = METRICS_ADDR.get() {
        return Ok(Some(*addr));
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    register_metrics();

    Ok(Some(*METRICS_ADDR.get_or_init(|| addr)))
}

fn register_metrics() {
    describe_counter!(
        MESSAGES_RECEIVED,
        "Total notifications received from the agent"
    );
    describe_counter!(SUBSCRIPTIONS, "Total subscriptions finished, by outcome");
    describe_counter!(
        STREAM_ERRORS,
        "Total subscriptions that failed, by error kind"
    );
}

/// Record a received notification.
pub fn record_message_received(kind: SubscriptionKind) {
    counter!(MESSAGES_RECEIVED, "subscription" => kind.as_str()).increment(1);
}

/// Record a subscription's terminal outcome.
pub fn record_subscription_finished(kind: SubscriptionKind, outcome: &SubscriptionOutcome) {
    counter!(
        SUBSCRIPTIONS,
        "subscription" => kind.as_str(),
        "outcome" => outcome.state().as_str()
    )
    .increment(1);

    if let Some(error) = outcome.error() {
        counter!(
            STREAM_ERRORS,
            "subscription" => kind.as_str(),
            "error_kind" => error.kind_str()
        )
        .increment(1);
    }
}
