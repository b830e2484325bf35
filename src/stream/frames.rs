//! Inbound frame types for the push-subscription transport.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::telemetry::{JobEventKind, QueueDepth, WorkerStatus};

/// A demultiplexed inbound frame.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    Metrics(MetricsFrame),
    Lifecycle {
        kind: JobEventKind,
        frame: JobLifecycleFrame,
    },
}

/// Per-second rates as reported inside a metrics frame.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ThroughputRates {
    pub processed_per_second: f64,
    pub failed_per_second: f64,
    pub enqueued_per_second: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkerRoster {
    pub total: u64,
    pub active: Vec<WorkerStatus>,
}

/// The periodic metrics-snapshot frame: queue depths, aggregate throughput,
/// worker roster, and an overall error rate.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsFrame {
    pub queues: Vec<QueueDepth>,
    #[serde(default)]
    pub throughput: ThroughputRates,
    #[serde(default)]
    pub workers: WorkerRoster,
    #[serde(default)]
    pub error_rate: f64,
}

/// Payload of a discrete job-lifecycle frame.
///
/// Servers differ on field names, so the accessors below apply the same
/// fallback chains the dashboard always has: `job_id` over `id`, `type`
/// over `job_type`, and `"default"` for a missing queue.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobLifecycleFrame {
    pub job_id: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub job_type: Option<String>,
    pub queue: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub error: Option<String>,
    pub attempt: Option<u32>,
}

impl JobLifecycleFrame {
    pub fn job_id(&self) -> &str {
        self.job_id.as_deref().or(self.id.as_deref()).unwrap_or("")
    }

    pub fn job_type(&self) -> &str {
        self.type_name
            .as_deref()
            .or(self.job_type.as_deref())
            .unwrap_or("unknown")
    }

    pub fn queue(&self) -> &str {
        self.queue.as_deref().unwrap_or("default")
    }
}
