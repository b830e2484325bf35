//! Bounded time-series buffers.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One throughput reading. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputSample {
    pub timestamp: DateTime<Utc>,
    pub processed_per_sec: f64,
    pub failed_per_sec: f64,
    pub enqueued_per_sec: f64,
}

/// One error-rate reading. The anomaly flag is computed at append time from
/// the trailing window and never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorRateSample {
    pub timestamp: DateTime<Utc>,
    pub error_rate: f64,
    pub total_errors: u64,
    pub is_anomaly: bool,
}

/// Append-only sequence with a fixed capacity; the oldest entry is evicted
/// in the same step that would overflow it. There is no separate cleanup
/// pass, so the bound holds at every instant.
#[derive(Debug, Clone)]
pub struct SampleWindow<T> {
    samples: VecDeque<T>,
    cap: usize,
}

impl<T> SampleWindow<T> {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Oldest-first iteration, matching arrival order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.samples.iter()
    }
}

impl<T: Clone> SampleWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}
