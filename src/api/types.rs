//! Wire types for the admin API pull endpoints.

use serde::Deserialize;

/// Job-state counters as reported by the stats and queue endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct JobCounts {
    pub available: u64,
    pub active: u64,
    pub scheduled: u64,
    pub retryable: u64,
    pub completed: u64,
    pub discarded: u64,
    pub cancelled: u64,
}

impl JobCounts {
    /// Jobs currently somewhere in the system (not yet completed or dropped).
    pub fn pending_total(&self) -> u64 {
        self.available + self.active + self.scheduled + self.retryable
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct MinuteThroughput {
    pub processed_per_minute: f64,
    pub failed_per_minute: f64,
}

/// Aggregate statistics snapshot from `GET /ojs/v1/admin/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregateStats {
    pub queues: u64,
    pub workers: u64,
    pub jobs: JobCounts,
    pub throughput: MinuteThroughput,
    pub uptime_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSummary {
    pub name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub counts: JobCounts,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// One page of `GET /ojs/v1/admin/queues`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueuePage {
    pub items: Vec<QueueSummary>,
    pub pagination: Option<Pagination>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_parse_tolerates_missing_sections() {
        let stats: AggregateStats = serde_json::from_str(
            r#"{"queues": 3, "workers": 5, "jobs": {"active": 2, "completed": 40}}"#,
        )
        .unwrap();

        assert_eq!(stats.queues, 3);
        assert_eq!(stats.workers, 5);
        assert_eq!(stats.jobs.active, 2);
        assert_eq!(stats.jobs.completed, 40);
        assert_eq!(stats.jobs.discarded, 0);
        assert_eq!(stats.throughput.processed_per_minute, 0.0);
    }

    #[test]
    fn pending_total_excludes_terminal_states() {
        let counts = JobCounts {
            available: 1,
            active: 2,
            scheduled: 3,
            retryable: 4,
            completed: 100,
            discarded: 50,
            cancelled: 7,
        };
        assert_eq!(counts.pending_total(), 10);
    }

    #[test]
    fn queue_page_parses_listing() {
        let page: QueuePage = serde_json::from_str(
            r#"{
                "items": [
                    {"name": "default", "paused": false, "counts": {"available": 4, "retryable": 1}},
                    {"name": "mailers", "counts": {}}
                ],
                "pagination": {"page": 1, "per_page": 50, "total": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].counts.available, 4);
        assert_eq!(page.items[1].name, "mailers");
        assert_eq!(page.pagination.unwrap().total, 2);
    }
}
