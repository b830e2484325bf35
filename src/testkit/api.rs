//! Scripted [`AdminApi`] implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{AdminApi, AggregateStats, QueuePage};
use crate::error::{Error, Result};

/// Scripted pull endpoints.
///
/// Each call pops the next scripted result; when the queue is exhausted the
/// fallback value (if any) is repeated, otherwise the call fails. Persistent
/// failure is therefore "no script, no fallback".
#[derive(Default)]
pub struct ScriptedApi {
    stats_results: Mutex<VecDeque<Result<AggregateStats>>>,
    queues_results: Mutex<VecDeque<Result<QueuePage>>>,
    fallback_stats: Mutex<Option<AggregateStats>>,
    fallback_queues: Mutex<Option<QueuePage>>,
    stats_calls: AtomicU32,
    queues_calls: AtomicU32,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats_results(self, results: Vec<Result<AggregateStats>>) -> Self {
        *self.stats_results.lock() = results.into();
        self
    }

    pub fn with_queue_results(self, results: Vec<Result<QueuePage>>) -> Self {
        *self.queues_results.lock() = results.into();
        self
    }

    /// Repeat this stats snapshot forever once the scripted results drain.
    pub fn with_repeating_stats(self, stats: AggregateStats) -> Self {
        *self.fallback_stats.lock() = Some(stats);
        self
    }

    /// Repeat this queue page forever once the scripted results drain.
    pub fn with_repeating_queues(self, page: QueuePage) -> Self {
        *self.fallback_queues.lock() = Some(page);
        self
    }

    pub fn stats_calls(&self) -> u32 {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub fn queues_calls(&self) -> u32 {
        self.queues_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminApi for ScriptedApi {
    async fn stats(&self) -> Result<AggregateStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.stats_results.lock().pop_front() {
            return result;
        }
        self.fallback_stats
            .lock()
            .clone()
            .ok_or_else(|| Error::Stream("scripted stats exhausted".into()))
    }

    async fn queues(&self, _page: u64, _per_page: u64) -> Result<QueuePage> {
        self.queues_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.queues_results.lock().pop_front() {
            return result;
        }
        self.fallback_queues
            .lock()
            .clone()
            .ok_or_else(|| Error::Stream("scripted queue listing exhausted".into()))
    }
}
