//! Agent Subscription Channels
//!
//! Each channel connects once, issues exactly one streaming call and hands
//! the response stream back. Nothing is retried; any failure before the
//! stream is open becomes `SubscriptionError::ChannelUnavailable`.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use super::proto::amdgpu::{
    Event, EventFilter, EventId, EventList, EventSubscribeRequest, GpuWatch,
    GpuWatchSubscribeRequest, event_filter, event_svc_client::EventSvcClient,
    gpu_watch_svc_client::GpuWatchSvcClient,
};
use crate::application::ports::{NotificationStream, SubscriptionChannel};
use crate::domain::error::SubscriptionError;
use crate::domain::filter::SubscriptionFilter;
use crate::domain::subscription::SubscriptionKind;
use crate::infrastructure::config::{ConfigError, ConnectionSettings};

// =============================================================================
// Endpoint
// =============================================================================

/// Resolved agent endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcEndpoint {
    uri: String,
    tls: bool,
    connect_timeout: Option<Duration>,
}

impl GrpcEndpoint {
    /// Resolve the endpoint for `settings`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an empty address or a bad port.
    pub fn new(settings: &ConnectionSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            uri: settings.endpoint_uri()?,
            tls: settings.tls,
            connect_timeout: settings.connect_timeout,
        })
    }

    /// Endpoint URI, e.g. `http://10.0.0.5:50061`.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::ChannelUnavailable` if the URI is rejected
    /// or the connection cannot be established.
    pub async fn connect(&self) -> Result<Channel, SubscriptionError> {
        let mut endpoint = Endpoint::from_shared(self.uri.clone())
            .map_err(|e| self.unavailable(error_chain(&e)))?
            .tcp_nodelay(true);

        if let Some(timeout) = self.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if self.tls {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| self.unavailable(error_chain(&e)))?;
        }

        tracing::debug!(endpoint = %self.uri, tls = self.tls, "Connecting to agent");
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| self.unavailable(error_chain(&e)))?;
        tracing::debug!(endpoint = %self.uri, "Connected to agent");

        Ok(channel)
    }

    fn unavailable(&self, reason: impl fmt::Display) -> SubscriptionError {
        SubscriptionError::ChannelUnavailable {
            endpoint: self.uri.clone(),
            reason: reason.to_string(),
        }
    }

    fn rejected(&self, status: &tonic::Status) -> SubscriptionError {
        self.unavailable(format_args!(
            "subscribe call rejected ({:?}): {}",
            status.code(),
            status.message()
        ))
    }
}

/// `Display` of an error followed by each of its sources.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// =============================================================================
// Requests
// =============================================================================

impl From<&SubscriptionFilter> for EventSubscribeRequest {
    fn from(filter: &SubscriptionFilter) -> Self {
        Self {
            filter: Some(EventFilter {
                filter: Some(event_filter::Filter::Events(EventList {
                    id: filter.event_type_ids.clone(),
                })),
                gpu: filter.entity_ids_wire(),
            }),
        }
    }
}

impl From<&SubscriptionFilter> for GpuWatchSubscribeRequest {
    fn from(filter: &SubscriptionFilter) -> Self {
        Self {
            id: filter.entity_ids_wire(),
        }
    }
}

/// Event codes the vendored schema does not name.
fn unknown_event_ids(codes: &[i32]) -> Vec<i32> {
    codes
        .iter()
        .copied()
        .filter(|code| EventId::try_from(*code).is_err())
        .collect()
}

// =============================================================================
// Channels
// =============================================================================

/// Channel for `EventSvc.EventSubscribe`.
#[derive(Debug, Clone)]
pub struct EventChannel {
    endpoint: GrpcEndpoint,
}

impl EventChannel {
    /// Create a channel targeting `endpoint`. Nothing connects until `open`.
    #[must_use]
    pub const fn new(endpoint: GrpcEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl SubscriptionChannel for EventChannel {
    type Message = Event;

    fn kind(&self) -> SubscriptionKind {
        SubscriptionKind::Events
    }

    async fn open(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<NotificationStream<Event>, SubscriptionError> {
        let unknown = unknown_event_ids(&filter.event_type_ids);
        if !unknown.is_empty() {
            tracing::warn!(
                codes = ?unknown,
                "Subscribing to event ids this client cannot name"
            );
        }

        let mut client = EventSvcClient::new(self.endpoint.connect().await?);
        let response = client
            .event_subscribe(EventSubscribeRequest::from(&filter))
            .await
            .map_err(|status| self.endpoint.rejected(&status))?;

        tracing::info!(
            endpoint = %self.endpoint.uri(),
            events = ?filter.event_type_ids,
            gpus = filter.entity_ids.len(),
            "Event stream opened"
        );
        Ok(Box::pin(response.into_inner()))
    }
}

/// Channel for `GPUWatchSvc.GPUWatchSubscribe`.
#[derive(Debug, Clone)]
pub struct GpuWatchChannel {
    endpoint: GrpcEndpoint,
}

impl GpuWatchChannel {
    /// Create a channel targeting `endpoint`. Nothing connects until `open`.
    #[must_use]
    pub const fn new(endpoint: GrpcEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl SubscriptionChannel for GpuWatchChannel {
    type Message = GpuWatch;

    fn kind(&self) -> SubscriptionKind {
        SubscriptionKind::GpuWatch
    }

    async fn open(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<NotificationStream<GpuWatch>, SubscriptionError> {
        let mut client = GpuWatchSvcClient::new(self.endpoint.connect().await?);
        let response = client
            .gpu_watch_subscribe(GpuWatchSubscribeRequest::from(&filter))
            .await
            .map_err(|status| self.endpoint.rejected(&status))?;

        tracing::info!(
            endpoint = %self.endpoint.uri(),
            watches = filter.entity_ids.len(),
            "GPU watch stream opened"
        );
        Ok(Box::pin(response.into_inner()))
    }
}
