//! Push-subscription transport abstraction.

pub mod frames;
pub mod sse;

use async_trait::async_trait;

use crate::error::Result;

pub use frames::{JobLifecycleFrame, MetricsFrame, StreamFrame, ThroughputRates, WorkerRoster};
pub use sse::{SseStream, SseStreamFactory};

/// One push-subscription session to the telemetry endpoint.
///
/// Lifecycle per connection: `connect`, then `next_frame` until it returns
/// `None` (transport-level failure or end of stream), then `close` exactly
/// once. Per-frame parse failures are the implementation's problem: they are
/// skipped silently and never surface through this interface.
#[async_trait]
pub trait TelemetryStream: Send {
    async fn connect(&mut self) -> Result<()>;
    async fn next_frame(&mut self) -> Option<StreamFrame>;
    async fn close(&mut self);
}

/// Creates the stream for one driver generation.
///
/// Returning `None` means the environment offers no push-subscription
/// capability at all; the session then starts directly in polling mode.
pub trait StreamFactory: Send + Sync {
    fn create(&self) -> Option<Box<dyn TelemetryStream>>;
}
