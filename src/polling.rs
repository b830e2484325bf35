//! Polling fallback transport.
//!
//! Once the reconnect budget is spent (or when no push capability exists)
//! the session drives this instead: each tick pulls the aggregate stats and
//! the queue listing, derives per-second rates from successive counter
//! snapshots, and feeds the same aggregator the stream would.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::{AdminApi, AggregateStats};
use crate::session::SessionShared;
use crate::telemetry::aggregator::PolledReading;
use crate::telemetry::QueueDepth;

/// Counter values remembered from the previous tick.
#[derive(Debug, Clone, Copy)]
struct PollCursor {
    at: DateTime<Utc>,
    completed: u64,
    discarded: u64,
}

pub struct PollingFallback {
    api: Arc<dyn AdminApi>,
    cursor: Option<PollCursor>,
}

impl PollingFallback {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self { api, cursor: None }
    }

    /// Run one interval tick. The two fetches recover independently: a
    /// queue-listing failure never aborts the stats update and vice versa.
    /// Failures become a connection-error annotation and are retried on the
    /// next tick; previously rendered data stays in place.
    pub async fn tick(&mut self, shared: &SessionShared) {
        let mut failure: Option<String> = None;

        match self.api.stats().await {
            Ok(stats) => {
                let reading = self.ingest_stats(&stats, Utc::now());
                shared.record_polled(&reading);
            }
            Err(err) => {
                debug!(error = %err, "stats poll failed");
                failure = Some(err.to_string());
            }
        }

        match self.api.queues(1, 100).await {
            Ok(page) => {
                let depths: Vec<QueueDepth> = page
                    .items
                    .iter()
                    .map(|q| QueueDepth {
                        queue: q.name.clone(),
                        available: q.counts.available,
                        active: q.counts.active,
                        scheduled: q.counts.scheduled,
                        retryable: q.counts.retryable,
                    })
                    .collect();
                shared.replace_queue_depths(depths);
            }
            Err(err) => {
                debug!(error = %err, "queue listing poll failed");
                failure.get_or_insert_with(|| err.to_string());
            }
        }

        match failure {
            None => shared.poll_succeeded(Utc::now()),
            Some(message) => shared.poll_failed(message),
        }
    }

    /// Derive a reading from one stats snapshot.
    ///
    /// Per-second rates come from counter deltas against the previous tick;
    /// when there is no previous tick, the elapsed time is zero, or a delta
    /// is non-positive (counter reset), the snapshot's own per-minute rate
    /// divided by 60 is used instead. The cursor is updated unconditionally.
    pub fn ingest_stats(&mut self, stats: &AggregateStats, now: DateTime<Utc>) -> PolledReading {
        let naive_processed = stats.throughput.processed_per_minute / 60.0;
        let naive_failed = stats.throughput.failed_per_minute / 60.0;
        let completed = stats.jobs.completed;
        let discarded = stats.jobs.discarded;

        let (processed_per_sec, failed_per_sec) = match self.cursor {
            Some(prev) => {
                let dt = (now - prev.at).num_milliseconds() as f64 / 1_000.0;
                if dt > 0.0 {
                    let delta_completed = completed as i64 - prev.completed as i64;
                    let delta_discarded = discarded as i64 - prev.discarded as i64;
                    (
                        if delta_completed > 0 {
                            delta_completed as f64 / dt
                        } else {
                            naive_processed
                        },
                        if delta_discarded > 0 {
                            delta_discarded as f64 / dt
                        } else {
                            naive_failed
                        },
                    )
                } else {
                    (naive_processed, naive_failed)
                }
            }
            None => (naive_processed, naive_failed),
        };

        self.cursor = Some(PollCursor {
            at: now,
            completed,
            discarded,
        });

        let error_rate = if stats.jobs.pending_total() > 0 {
            discarded as f64 / ((completed + discarded).max(1)) as f64 * 100.0
        } else {
            0.0
        };

        PolledReading {
            timestamp: now,
            processed_per_sec,
            failed_per_sec,
            error_rate,
            total_errors: discarded,
            total_active_jobs: stats.jobs.active,
            total_workers: stats.workers,
        }
    }
}
