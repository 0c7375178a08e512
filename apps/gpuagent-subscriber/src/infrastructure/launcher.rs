//! Command-Line Launcher
//!
//! Wiring shared by both binaries: metrics, TLS provider, endpoint
//! resolution, spawning the subscription, and cancelling it on
//! SIGINT/SIGTERM before joining.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use crate::application::ports::SubscriptionChannel;
use crate::application::services::{SubscriptionRunner, SubscriptionTask};
use crate::domain::filter::FilterCriteria;
use crate::domain::subscription::SubscriptionOutcome;
use crate::infrastructure::config::ConnectionArgs;
use crate::infrastructure::grpc::GrpcEndpoint;
use crate::infrastructure::metrics::init_metrics;
use crate::infrastructure::reporting::TracingReporter;

/// Exit code for configuration and setup failures.
pub const SETUP_EXIT_CODE: u8 = 2;

/// Run one subscription from the command line until it ends.
///
/// `channel` builds the service-specific channel for the resolved endpoint.
///
/// # Errors
///
/// Returns an error if setup fails before the subscription starts: invalid
/// connection settings or a metrics listener that cannot bind.
pub async fn run<C, F>(
    connection: &ConnectionArgs,
    criteria: FilterCriteria,
    channel: F,
) -> anyhow::Result<SubscriptionOutcome>
where
    C: SubscriptionChannel + 'static,
    F: FnOnce(GrpcEndpoint) -> C,
{
    if let Some(addr) = init_metrics(connection.metrics_port).with_context(|| {
        format!(
            "failed to start metrics exporter on port {}",
            connection.metrics_port
        )
    })? {
        tracing::info!(%addr, "Serving Prometheus metrics");
    }

    if connection.tls && rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("rustls crypto provider already installed");
    }

    let endpoint =
        GrpcEndpoint::new(&connection.settings()).context("invalid connection settings")?;
    tracing::info!(
        endpoint = endpoint.uri(),
        deadline_secs = connection.deadline_secs,
        "Configuration loaded"
    );

    let reporter = Arc::new(TracingReporter::new(connection.format));
    let runner = SubscriptionRunner::new(channel(endpoint), criteria, reporter);
    let handle = SubscriptionTask::spawn(runner, connection.task_options());

    Ok(handle.join_or_cancel_on(shutdown_signal()).await)
}

/// Resolve on SIGINT or SIGTERM.
///
/// A handler that cannot be installed never fires; the subscription then
/// runs until its stream ends.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, cancelling subscription");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, cancelling subscription");
        }
    }
}
