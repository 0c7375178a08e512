//! Configuration Module
//!
//! Command-line arguments, connection settings and `.env` loading.

mod cli;
mod settings;

pub use cli::{ConnectionArgs, EventSubscribeArgs, GpuWatchSubscribeArgs};
pub use settings::{
    ConfigError, ConnectionSettings, DEFAULT_GRPC_PORT, load_dotenv, load_dotenv_from,
};
