//! Jobpulse - resilient real-time telemetry client for job-queue dashboards.
//!
//! This crate embeds the live-metrics core of an operator dashboard for a
//! distributed job-processing system: per-queue depth, aggregate throughput,
//! the worker roster, error-rate anomalies, and a feed of discrete job
//! lifecycle events, all kept fresh across flaky networks without operator
//! intervention.
//!
//! # Architecture
//!
//! A [`session::TelemetrySession`] negotiates between two transports:
//!
//! - **Stream**: a long-lived push subscription ([`stream::SseStream`])
//!   demultiplexing metrics-snapshot and job-lifecycle frames. Drops are
//!   retried with jittered exponential backoff ([`backoff`]).
//! - **Polling**: once the reconnect budget is spent, periodic pulls
//!   against the admin API ([`api::AdminClient`]) synthesize the same
//!   samples from successive counter snapshots ([`polling`]).
//!
//! Both feed one [`telemetry::SampleAggregator`] with bounded windows and
//! trailing-window anomaly detection, so the rendered series is continuous
//! across a fallback. Consumers read cloned snapshots; all mutation stays
//! inside the session.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`error`] - Error types for the crate
//! - [`backoff`] - Jittered exponential reconnect delays
//! - [`api`] - Pull boundary to the admin API
//! - [`stream`] - Push-subscription transport and frame types
//! - [`telemetry`] - Sample windows, event log, connection state
//! - [`polling`] - Polling fallback and rate derivation
//! - [`session`] - Transport negotiation and lifecycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jobpulse::api::AdminClient;
//! use jobpulse::config::Config;
//! use jobpulse::session::TelemetrySession;
//! use jobpulse::stream::SseStreamFactory;
//!
//! # fn main() -> anyhow::Result<()> {
//! # let rt = tokio::runtime::Runtime::new()?;
//! # rt.block_on(async {
//! let config = Config::default();
//! let api = Arc::new(AdminClient::new(&config.network.api_url)?);
//! let stream_url = url::Url::parse(&config.network.api_url)?
//!     .join(&config.network.stream_path)?;
//! let streams = Arc::new(SseStreamFactory::new(reqwest::Client::new(), stream_url));
//!
//! let session = TelemetrySession::new(api, streams, config.telemetry.clone());
//! let metrics = session.metrics();
//! println!("{} queues visible", metrics.queue_depths.len());
//! session.disconnect();
//! # Ok::<_, anyhow::Error>(())
//! # })
//! # }
//! ```

pub mod api;
pub mod backoff;
pub mod config;
pub mod error;
pub mod polling;
pub mod session;
pub mod stream;
pub mod telemetry;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
