//! Command-Line Arguments
//!
//! One argument struct per binary. Both flatten [`ConnectionArgs`], and
//! every connection flag can also come from the environment (or `.env`).

use std::time::Duration;

use clap::{Args, Parser};

use super::settings::{ConnectionSettings, DEFAULT_GRPC_PORT};
use crate::application::services::TaskOptions;
use crate::domain::filter::FilterCriteria;
use crate::infrastructure::reporting::OutputFormat;

/// Connection, output and lifetime flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Compute node IP address or hostname
    #[arg(long = "node-ip", env = "GPUAGENT_NODE_IP")]
    pub node_ip: String,

    /// GPU agent gRPC port
    #[arg(long = "grpc-port", env = "GPUAGENT_GRPC_PORT", default_value = DEFAULT_GRPC_PORT)]
    pub grpc_port: String,

    /// Connect over TLS using the platform's native roots
    #[arg(long, env = "GPUAGENT_TLS")]
    pub tls: bool,

    /// Give up connecting after this many seconds (at least 1)
    #[arg(
        long,
        env = "GPUAGENT_CONNECT_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub connect_timeout_secs: Option<u64>,

    /// Stop the subscription after this many seconds (at least 1)
    #[arg(
        long,
        env = "GPUAGENT_DEADLINE_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub deadline_secs: Option<u64>,

    /// How each notification is logged
    #[arg(long, value_enum, env = "GPUAGENT_OUTPUT_FORMAT", default_value_t = OutputFormat::Debug)]
    pub format: OutputFormat,

    /// Serve Prometheus metrics on this port (0 = disabled)
    #[arg(long, env = "GPUAGENT_METRICS_PORT", default_value_t = 0)]
    pub metrics_port: u16,
}

impl ConnectionArgs {
    /// Resolved connection settings.
    #[must_use]
    pub fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            node_address: self.node_ip.clone(),
            port: self.grpc_port.clone(),
            tls: self.tls,
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Options for the background task.
    #[must_use]
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// `event-subscribe`: stream GPU events.
#[derive(Debug, Parser)]
#[command(
    name = "event-subscribe",
    version,
    about = "Subscribe to GPU agent events and log each one as it arrives"
)]
pub struct EventSubscribeArgs {
    /// Connection flags
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Comma separated GPU uuid list
    #[arg(long)]
    pub id: String,

    /// Comma separated event list (numbers only)
    #[arg(long)]
    pub events: String,
}

impl EventSubscribeArgs {
    /// Filter criteria from the command line.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::events(self.events.as_str(), self.id.as_str())
    }
}

/// `gpu-watch-subscribe`: stream GPU watch updates.
#[derive(Debug, Parser)]
#[command(
    name = "gpu-watch-subscribe",
    version,
    about = "Subscribe to GPU watch objects and log each update as it arrives"
)]
pub struct GpuWatchSubscribeArgs {
    /// Connection flags
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Comma separated GPU watch uuid list
    #[arg(long)]
    pub id: String,
}

impl GpuWatchSubscribeArgs {
    /// Filter criteria from the command line.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::gpu_watch(self.id.as_str())
    }
}
