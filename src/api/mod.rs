//! Boundary to the admin API collaborator.

pub mod client;
pub mod types;

pub use client::{AdminApi, AdminClient};
pub use types::{AggregateStats, JobCounts, MinuteThroughput, Pagination, QueuePage, QueueSummary};
