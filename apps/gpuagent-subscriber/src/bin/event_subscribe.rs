//! Event Subscriber Binary
//!
//! Subscribes to GPU events on an agent and logs each one as it arrives.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin event-subscribe -- --node-ip 10.0.0.5 \
//!     --id 123e4567-e89b-12d3-a456-426614174000 --events 1,2
//! ```
//!
//! # Environment Variables
//!
//! - `GPUAGENT_NODE_IP`, `GPUAGENT_GRPC_PORT` (default: 50061)
//! - `GPUAGENT_METRICS_PORT`: Prometheus port (default: 0, disabled)
//! - `OTEL_ENABLED`: Export traces over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::process::ExitCode;

use clap::Parser;
use gpuagent_subscriber::EventChannel;
use gpuagent_subscriber::infrastructure::config::{EventSubscribeArgs, load_dotenv};
use gpuagent_subscriber::infrastructure::launcher::{self, SETUP_EXIT_CODE};
use gpuagent_subscriber::infrastructure::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let args = EventSubscribeArgs::parse();

    let _telemetry_guard = telemetry::init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting event subscriber"
    );

    match launcher::run(&args.connection, args.criteria(), EventChannel::new).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!("Event subscriber setup failed: {e:#}");
            ExitCode::from(SETUP_EXIT_CODE)
        }
    }
}
