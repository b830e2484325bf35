//! Bounded, most-recent-first log of discrete job lifecycle events.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobEventKind {
    Enqueued,
    Completed,
    Failed,
    Cancelled,
}

impl JobEventKind {
    /// Map a stream event name (`job.enqueued`, ...) to a kind.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "job.enqueued" => Some(Self::Enqueued),
            "job.completed" => Some(Self::Completed),
            "job.failed" => Some(Self::Failed),
            "job.cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// One job lifecycle event as shown in the live feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    /// Synthesized client-side: the upstream stream carries no identifier
    /// that stays unique across reconnects.
    pub id: String,
    pub kind: JobEventKind,
    pub job_id: String,
    pub job_type: String,
    pub queue: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    pub attempt: Option<u32>,
}

/// Millisecond timestamp plus a short random base36 suffix.
pub(crate) fn synthesize_event_id(now: DateTime<Utc>) -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}

/// Most-recent-first list with a hard cap. Insertion and truncation are one
/// step; callers never observe the log above its cap.
pub struct EventLog {
    entries: VecDeque<JobEvent>,
    cap: usize,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, event: JobEvent) {
        self.entries.push_front(event);
        self.entries.truncate(self.cap);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<JobEvent> {
        self.entries.iter().cloned().collect()
    }
}
