//! Event Subscription Integration Tests
//!
//! Runs the real channel, consumer and task wrapper against an in-process
//! `EventSvc` on an ephemeral port.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt, stream};
use parking_lot::Mutex;
use tokio::time::timeout;
use tonic::transport::Server;
use tonic::{Code, Request, Response, Status};

use gpuagent_subscriber::infrastructure::grpc::proto::amdgpu::{
    Event, EventId, EventSeverity, EventSubscribeRequest, event_filter,
    event_svc_server::{EventSvc, EventSvcServer},
};
use gpuagent_subscriber::{
    ConnectionSettings, EventChannel, FilterCriteria, GrpcEndpoint, RecordingReporter,
    SubscriptionError, SubscriptionOutcome, SubscriptionRunner, SubscriptionState,
    SubscriptionTask, TaskOptions,
};

const GPU: &str = "123e4567-e89b-12d3-a456-426614174000";
const GPU_BYTES: [u8; 16] = [
    0x12, 0x3e, 0x45, 0x67, 0xe8, 0x9b, 0x12, 0xd3, 0xa4, 0x56, 0x42, 0x66, 0x14, 0x17, 0x40, 0x00,
];

// =============================================================================
// Fake agent
// =============================================================================

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, Status>> + Send>>;

#[derive(Clone, Default)]
struct FakeAgent {
    script: Vec<Result<Event, Status>>,
    hold_open: bool,
    requests: Arc<Mutex<Vec<EventSubscribeRequest>>>,
}

#[tonic::async_trait]
impl EventSvc for FakeAgent {
    type EventSubscribeStream = EventStream;

    async fn event_subscribe(
        &self,
        request: Request<EventSubscribeRequest>,
    ) -> Result<Response<Self::EventSubscribeStream>, Status> {
        self.requests.lock().push(request.into_inner());

        let scripted = stream::iter(self.script.clone());
        let stream: EventStream = if self.hold_open {
            Box::pin(scripted.chain(stream::pending()))
        } else {
            Box::pin(scripted)
        };
        Ok(Response::new(stream))
    }
}

async fn start_agent(agent: FakeAgent) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(EventSvcServer::new(agent))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    (addr, handle)
}

fn event(description: &str) -> Event {
    Event {
        id: EventId::ThermalThrottle as i32,
        severity: EventSeverity::Warn as i32,
        gpu: GPU_BYTES.to_vec(),
        description: description.to_string(),
        ..Event::default()
    }
}

fn channel_for(addr: SocketAddr) -> EventChannel {
    let settings =
        ConnectionSettings::new(addr.ip().to_string()).with_port(addr.port().to_string());
    EventChannel::new(GrpcEndpoint::new(&settings).unwrap())
}

fn runner(
    channel: EventChannel,
    criteria: FilterCriteria,
) -> (SubscriptionRunner<EventChannel>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    (
        SubscriptionRunner::new(channel, criteria, reporter.clone()),
        reporter,
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_events_are_logged_in_order_then_completed() {
    let agent = FakeAgent {
        script: vec![Ok(event("first")), Ok(event("second")), Ok(event("third"))],
        ..FakeAgent::default()
    };
    let requests = Arc::clone(&agent.requests);
    let (addr, server) = start_agent(agent).await;

    let (runner, reporter) = runner(channel_for(addr), FilterCriteria::events("1,2", GPU));
    let handle = SubscriptionTask::spawn(runner, TaskOptions::default());
    let outcome = timeout(Duration::from_secs(5), handle.join()).await.unwrap();

    assert!(matches!(outcome, SubscriptionOutcome::Completed { received: 3 }));

    let logged = reporter.notification_debugs();
    assert_eq!(logged.len(), 3);
    assert!(logged[0].contains(r#"description: "first""#));
    assert!(logged[1].contains(r#"description: "second""#));
    assert!(logged[2].contains(r#"description: "third""#));

    let requests = requests.lock();
    assert_eq!(requests.len(), 1);
    let filter = requests[0].filter.clone().unwrap();
    match filter.filter {
        Some(event_filter::Filter::Events(list)) => assert_eq!(list.id, vec![1, 2]),
        other => panic!("unexpected filter: {other:?}"),
    }
    assert_eq!(filter.gpu, vec![GPU_BYTES.to_vec()]);

    server.abort();
}

#[tokio::test]
async fn test_agent_error_mid_stream_fails_without_reopening() {
    let agent = FakeAgent {
        script: vec![Ok(event("only")), Err(Status::internal("event ring overflow"))],
        ..FakeAgent::default()
    };
    let requests = Arc::clone(&agent.requests);
    let (addr, server) = start_agent(agent).await;

    let (runner, reporter) = runner(channel_for(addr), FilterCriteria::events("2", GPU));
    let status = runner.status();
    let outcome = timeout(
        Duration::from_secs(5),
        SubscriptionTask::spawn(runner, TaskOptions::default()).join(),
    )
    .await
    .unwrap();

    match outcome {
        SubscriptionOutcome::Failed {
            received: 1,
            error: SubscriptionError::StreamInterrupted { code, message, .. },
        } => {
            assert_eq!(code, Code::Internal);
            assert_eq!(message, "event ring overflow");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(reporter.notification_debugs().len(), 1);
    assert_eq!(status.state(), SubscriptionState::Failed);
    assert_eq!(requests.lock().len(), 1);

    server.abort();
}

#[tokio::test]
async fn test_unreachable_agent_is_channel_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (runner, reporter) = runner(channel_for(addr), FilterCriteria::events("1,2", GPU));
    let outcome = timeout(
        Duration::from_secs(10),
        SubscriptionTask::spawn(runner, TaskOptions::default()).join(),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        SubscriptionOutcome::Failed {
            received: 0,
            error: SubscriptionError::ChannelUnavailable { .. }
        }
    ));
    assert_eq!(outcome.exit_code(), 3);
    assert!(reporter.notification_debugs().is_empty());
}

#[tokio::test]
async fn test_invalid_filter_never_reaches_the_agent() {
    let agent = FakeAgent::default();
    let requests = Arc::clone(&agent.requests);
    let (addr, server) = start_agent(agent).await;

    let (runner, reporter) = runner(
        channel_for(addr),
        FilterCriteria::events("1,2", "not-a-uuid"),
    );
    let outcome = SubscriptionTask::spawn(runner, TaskOptions::default())
        .join()
        .await;

    assert!(matches!(
        outcome.error(),
        Some(SubscriptionError::InvalidFilterInput(_))
    ));
    assert_eq!(outcome.exit_code(), 2);
    assert!(requests.lock().is_empty());
    assert_eq!(reporter.transitions(), vec![SubscriptionState::Failed]);

    server.abort();
}

#[tokio::test]
async fn test_cancel_while_streaming() {
    let agent = FakeAgent {
        script: vec![Ok(event("before cancel"))],
        hold_open: true,
        ..FakeAgent::default()
    };
    let (addr, server) = start_agent(agent).await;

    let (runner, reporter) = runner(channel_for(addr), FilterCriteria::events("1", GPU));
    let handle = SubscriptionTask::spawn(runner, TaskOptions::default());
    let status = handle.status();

    timeout(Duration::from_secs(5), async {
        while status.received() < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    handle.cancel();
    let outcome = timeout(Duration::from_secs(5), handle.join()).await.unwrap();

    assert!(matches!(outcome, SubscriptionOutcome::Cancelled { received: 1 }));
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(reporter.finished_count(), 1);

    server.abort();
}

#[tokio::test]
async fn test_deadline_ends_an_open_stream() {
    let agent = FakeAgent {
        hold_open: true,
        ..FakeAgent::default()
    };
    let (addr, server) = start_agent(agent).await;

    let (runner, _reporter) = runner(channel_for(addr), FilterCriteria::events("1", GPU));
    let handle = SubscriptionTask::spawn(
        runner,
        TaskOptions {
            deadline: Some(Duration::from_millis(200)),
        },
    );
    let outcome = timeout(Duration::from_secs(5), handle.join()).await.unwrap();

    assert!(matches!(outcome, SubscriptionOutcome::Cancelled { received: 0 }));

    server.abort();
}
