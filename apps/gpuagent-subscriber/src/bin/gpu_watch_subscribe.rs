//! GPU Watch Subscriber Binary
//!
//! Subscribes to one or more GPU watch objects and logs every update.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gpu-watch-subscribe -- --node-ip 10.0.0.5 \
//!     --id 6a1f0c2e-0000-4000-8000-000000000001 --format pretty
//! ```

use std::process::ExitCode;

use clap::Parser;
use gpuagent_subscriber::GpuWatchChannel;
use gpuagent_subscriber::infrastructure::config::{GpuWatchSubscribeArgs, load_dotenv};
use gpuagent_subscriber::infrastructure::launcher::{self, SETUP_EXIT_CODE};
use gpuagent_subscriber::infrastructure::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let args = GpuWatchSubscribeArgs::parse();

    let _telemetry_guard = telemetry::init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting GPU watch subscriber"
    );

    match launcher::run(&args.connection, args.criteria(), GpuWatchChannel::new).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!("GPU watch subscriber setup failed: {e:#}");
            ExitCode::from(SETUP_EXIT_CODE)
        }
    }
}
