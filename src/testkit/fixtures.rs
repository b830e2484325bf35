//! Frame and snapshot constructors shared across tests.

use crate::api::{AggregateStats, JobCounts, MinuteThroughput, QueuePage, QueueSummary};
use crate::stream::{JobLifecycleFrame, MetricsFrame, StreamFrame, ThroughputRates, WorkerRoster};
use crate::telemetry::{JobEventKind, QueueDepth};

pub fn queue_depth(
    queue: &str,
    available: u64,
    active: u64,
    scheduled: u64,
    retryable: u64,
) -> QueueDepth {
    QueueDepth {
        queue: queue.into(),
        available,
        active,
        scheduled,
        retryable,
    }
}

pub fn metrics_frame(error_rate: f64, queues: Vec<QueueDepth>) -> StreamFrame {
    StreamFrame::Metrics(MetricsFrame {
        queues,
        throughput: ThroughputRates {
            processed_per_second: 10.0,
            failed_per_second: 0.5,
            enqueued_per_second: 11.0,
        },
        workers: WorkerRoster {
            total: 3,
            active: Vec::new(),
        },
        error_rate,
    })
}

pub fn lifecycle_frame(kind: JobEventKind, job_id: &str, queue: &str) -> StreamFrame {
    StreamFrame::Lifecycle {
        kind,
        frame: JobLifecycleFrame {
            job_id: Some(job_id.into()),
            queue: Some(queue.into()),
            type_name: Some("send_email".into()),
            ..Default::default()
        },
    }
}

pub fn aggregate_stats(completed: u64, discarded: u64) -> AggregateStats {
    AggregateStats {
        queues: 2,
        workers: 4,
        jobs: JobCounts {
            available: 3,
            active: 2,
            scheduled: 1,
            retryable: 1,
            completed,
            discarded,
            cancelled: 0,
        },
        throughput: MinuteThroughput {
            processed_per_minute: 60.0,
            failed_per_minute: 6.0,
        },
        uptime_seconds: Some(3_600),
    }
}

pub fn queue_page(names: &[&str]) -> QueuePage {
    QueuePage {
        items: names
            .iter()
            .map(|name| QueueSummary {
                name: (*name).into(),
                paused: false,
                counts: JobCounts {
                    available: 2,
                    active: 1,
                    scheduled: 0,
                    retryable: 1,
                    ..Default::default()
                },
            })
            .collect(),
        pagination: None,
    }
}
