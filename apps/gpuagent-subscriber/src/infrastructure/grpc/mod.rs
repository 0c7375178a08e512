//! gRPC Subscription Adapters
//!
//! Tonic clients for the agent's two streaming services and the rendering
//! of the messages they push.
//!
//! | Service | RPC | Message |
//! |---|---|---|
//! | `amdgpu.EventSvc` | `EventSubscribe` | `Event` |
//! | `amdgpu.GPUWatchSvc` | `GPUWatchSubscribe` | `GPUWatch` |

pub mod channel;
pub mod render;

// Allow clippy warnings and missing docs in generated code
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod amdgpu {
        include!(concat!(env!("OUT_DIR"), "/amdgpu.rs"));
    }
}

pub use channel::{EventChannel, GpuWatchChannel, GrpcEndpoint};
