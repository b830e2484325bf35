//! Bounded-memory aggregation of metric readings from either transport.

use chrono::{DateTime, Utc};

use super::samples::{ErrorRateSample, SampleWindow, ThroughputSample};
use super::{MetricsSnapshot, QueueDepth, WorkerStatus};
use crate::stream::frames::MetricsFrame;

/// Trailing samples considered when judging a new error-rate reading.
const ANOMALY_TRAILING_SAMPLES: usize = 10;
/// A reading is anomalous when it strictly exceeds this multiple of the
/// trailing mean.
const ANOMALY_FACTOR: f64 = 2.0;

/// A reading synthesized by the polling fallback from successive snapshots.
#[derive(Debug, Clone, Copy)]
pub struct PolledReading {
    pub timestamp: DateTime<Utc>,
    pub processed_per_sec: f64,
    pub failed_per_sec: f64,
    pub error_rate: f64,
    pub total_errors: u64,
    pub total_active_jobs: u64,
    pub total_workers: u64,
}

/// Owns both sample windows plus the latest queue/worker snapshot.
///
/// Both transports feed the same aggregator, so the rendered series is
/// continuous across a stream-to-polling fallback.
pub struct SampleAggregator {
    throughput: SampleWindow<ThroughputSample>,
    error_rate: SampleWindow<ErrorRateSample>,
    queue_depths: Vec<QueueDepth>,
    workers: Vec<WorkerStatus>,
    total_active_jobs: u64,
    total_workers: u64,
}

impl SampleAggregator {
    pub fn new(max_samples: usize) -> Self {
        Self {
            throughput: SampleWindow::new(max_samples),
            error_rate: SampleWindow::new(max_samples),
            queue_depths: Vec::new(),
            workers: Vec::new(),
            total_active_jobs: 0,
            total_workers: 0,
        }
    }

    /// Ingest one metrics-snapshot frame from the stream transport.
    pub fn record_metrics_frame(&mut self, frame: &MetricsFrame, now: DateTime<Utc>) {
        self.throughput.push(ThroughputSample {
            timestamp: now,
            processed_per_sec: frame.throughput.processed_per_second,
            failed_per_sec: frame.throughput.failed_per_second,
            enqueued_per_sec: frame.throughput.enqueued_per_second,
        });

        let total_errors: u64 = frame.queues.iter().map(|q| q.retryable).sum();
        let total_jobs: u64 = frame.queues.iter().map(QueueDepth::total).sum();
        // A system with no jobs anywhere has no meaningful error rate.
        let error_rate = if total_jobs > 0 { frame.error_rate } else { 0.0 };
        self.push_error_sample(now, error_rate, total_errors);

        self.queue_depths = frame.queues.clone();
        self.workers = frame.workers.active.clone();
        self.total_active_jobs = frame.queues.iter().map(|q| q.active).sum();
        self.total_workers = frame.workers.total;
    }

    /// Ingest one synthesized reading from the polling fallback.
    ///
    /// Queue depths and the worker roster are not touched here; the queue
    /// listing is polled separately and workers have no pull endpoint.
    pub fn record_polled(&mut self, reading: &PolledReading) {
        self.throughput.push(ThroughputSample {
            timestamp: reading.timestamp,
            processed_per_sec: reading.processed_per_sec,
            failed_per_sec: reading.failed_per_sec,
            enqueued_per_sec: 0.0,
        });
        self.push_error_sample(reading.timestamp, reading.error_rate, reading.total_errors);
        self.total_active_jobs = reading.total_active_jobs;
        self.total_workers = reading.total_workers;
    }

    pub fn replace_queue_depths(&mut self, depths: Vec<QueueDepth>) {
        self.queue_depths = depths;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_depths: self.queue_depths.clone(),
            throughput: self.throughput.to_vec(),
            workers: self.workers.clone(),
            error_rate: self.error_rate.to_vec(),
            total_active_jobs: self.total_active_jobs,
            total_workers: self.total_workers,
        }
    }

    /// Append an error-rate sample, flagging it against the trailing mean of
    /// the previously recorded values (the new sample is excluded).
    fn push_error_sample(&mut self, now: DateTime<Utc>, error_rate: f64, total_errors: u64) {
        let trailing: Vec<f64> = self
            .error_rate
            .iter()
            .rev()
            .take(ANOMALY_TRAILING_SAMPLES)
            .map(|s| s.error_rate)
            .collect();
        let mean = if trailing.is_empty() {
            0.0
        } else {
            trailing.iter().sum::<f64>() / trailing.len() as f64
        };
        // Strict inequality: exactly 2x the mean is not an anomaly, and a
        // zero or undefined mean never flags.
        let is_anomaly = mean > 0.0 && error_rate > mean * ANOMALY_FACTOR;

        self.error_rate.push(ErrorRateSample {
            timestamp: now,
            error_rate,
            total_errors,
            is_anomaly,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::frames::{MetricsFrame, ThroughputRates, WorkerRoster};

    fn frame(error_rate: f64, queues: Vec<QueueDepth>) -> MetricsFrame {
        MetricsFrame {
            queues,
            throughput: ThroughputRates {
                processed_per_second: 12.0,
                failed_per_second: 0.5,
                enqueued_per_second: 13.0,
            },
            workers: WorkerRoster {
                total: 4,
                active: Vec::new(),
            },
            error_rate,
        }
    }

    fn depth(queue: &str, active: u64, retryable: u64) -> QueueDepth {
        QueueDepth {
            queue: queue.into(),
            available: 1,
            active,
            scheduled: 0,
            retryable,
        }
    }

    fn agg_with_rates(rates: &[f64]) -> SampleAggregator {
        let mut agg = SampleAggregator::new(60);
        for &rate in rates {
            agg.push_error_sample(Utc::now(), rate, 0);
        }
        agg
    }

    #[test]
    fn metrics_frame_populates_snapshot() {
        let mut agg = SampleAggregator::new(60);
        agg.record_metrics_frame(
            &frame(1.5, vec![depth("default", 3, 2), depth("mailers", 1, 1)]),
            Utc::now(),
        );

        let snap = agg.snapshot();
        assert_eq!(snap.queue_depths.len(), 2);
        assert_eq!(snap.total_active_jobs, 4);
        assert_eq!(snap.total_workers, 4);
        assert_eq!(snap.throughput.len(), 1);
        assert_eq!(snap.throughput[0].processed_per_sec, 12.0);
        assert_eq!(snap.error_rate[0].error_rate, 1.5);
        assert_eq!(snap.error_rate[0].total_errors, 3);
    }

    #[test]
    fn error_rate_zeroed_when_no_jobs_exist() {
        let mut agg = SampleAggregator::new(60);
        let empty = QueueDepth {
            queue: "default".into(),
            available: 0,
            active: 0,
            scheduled: 0,
            retryable: 0,
        };
        agg.record_metrics_frame(&frame(9.0, vec![empty]), Utc::now());

        assert_eq!(agg.snapshot().error_rate[0].error_rate, 0.0);
    }

    #[test]
    fn windows_hold_most_recent_sixty_in_arrival_order() {
        let mut agg = SampleAggregator::new(60);
        for n in 0..90u64 {
            agg.record_metrics_frame(&frame(n as f64, vec![depth("q", 1, 0)]), Utc::now());
        }

        let snap = agg.snapshot();
        assert_eq!(snap.throughput.len(), 60);
        assert_eq!(snap.error_rate.len(), 60);
        let rates: Vec<f64> = snap.error_rate.iter().map(|s| s.error_rate).collect();
        assert_eq!(rates, (30..90).map(|n| n as f64).collect::<Vec<_>>());
    }

    #[test]
    fn anomaly_requires_strictly_more_than_twice_the_trailing_mean() {
        // Ten prior samples averaging 3.0.
        let mut agg = agg_with_rates(&[3.0; 10]);

        agg.push_error_sample(Utc::now(), 6.0, 0);
        assert!(!agg.snapshot().error_rate.last().unwrap().is_anomaly);

        let mut agg = agg_with_rates(&[3.0; 10]);
        agg.push_error_sample(Utc::now(), 6.01, 0);
        assert!(agg.snapshot().error_rate.last().unwrap().is_anomaly);
    }

    #[test]
    fn anomaly_uses_only_the_ten_most_recent_prior_samples() {
        // Early spike pushed out of the trailing window by ten quiet samples.
        let mut rates = vec![100.0];
        rates.extend([1.0; 10]);
        let mut agg = agg_with_rates(&rates);

        agg.push_error_sample(Utc::now(), 2.5, 0);
        assert!(agg.snapshot().error_rate.last().unwrap().is_anomaly);
    }

    #[test]
    fn zero_trailing_mean_never_flags() {
        let mut agg = agg_with_rates(&[0.0; 10]);
        agg.push_error_sample(Utc::now(), 50.0, 0);
        assert!(!agg.snapshot().error_rate.last().unwrap().is_anomaly);
    }

    #[test]
    fn first_sample_is_never_an_anomaly() {
        let mut agg = SampleAggregator::new(60);
        agg.push_error_sample(Utc::now(), 80.0, 0);
        assert!(!agg.snapshot().error_rate[0].is_anomaly);
    }

    #[test]
    fn polled_reading_leaves_queue_depths_alone() {
        let mut agg = SampleAggregator::new(60);
        agg.replace_queue_depths(vec![depth("default", 2, 0)]);
        agg.record_polled(&PolledReading {
            timestamp: Utc::now(),
            processed_per_sec: 3.0,
            failed_per_sec: 0.1,
            error_rate: 1.0,
            total_errors: 9,
            total_active_jobs: 2,
            total_workers: 7,
        });

        let snap = agg.snapshot();
        assert_eq!(snap.queue_depths.len(), 1);
        assert_eq!(snap.throughput[0].enqueued_per_sec, 0.0);
        assert_eq!(snap.total_workers, 7);
    }
}
