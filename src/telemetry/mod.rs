//! In-memory telemetry state: bounded sample windows, the lifecycle event
//! log, and the externally observable connection snapshot.
//!
//! Everything in this module is plain owned data. Mutation happens only
//! inside the session driver; rendering collaborators receive cloned
//! snapshots and have no write path back in.

pub mod aggregator;
pub mod connection;
pub mod events;
pub mod samples;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use aggregator::SampleAggregator;
pub use connection::{ConnectionInfo, ConnectionState, Transport};
pub use events::{EventLog, JobEvent, JobEventKind};
pub use samples::{ErrorRateSample, SampleWindow, ThroughputSample};

/// Latest depth counters for one queue. Replaced wholesale on every
/// snapshot; no per-queue history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    pub queue: String,
    pub available: u64,
    pub active: u64,
    pub scheduled: u64,
    pub retryable: u64,
}

impl QueueDepth {
    pub fn total(&self) -> u64 {
        self.available + self.active + self.scheduled + self.retryable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Running,
    Quiet,
    Stale,
    #[serde(other)]
    Unknown,
}

/// Mirror of the latest worker roster push; no history retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub id: String,
    pub state: WorkerState,
    #[serde(default)]
    pub active_jobs: u64,
    #[serde(default)]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

/// Read-only metrics structure handed to rendering collaborators.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub queue_depths: Vec<QueueDepth>,
    pub throughput: Vec<ThroughputSample>,
    pub workers: Vec<WorkerStatus>,
    pub error_rate: Vec<ErrorRateSample>,
    pub total_active_jobs: u64,
    pub total_workers: u64,
}
