//! Integration tests for the polling fallback transport.

use std::sync::Arc;
use std::time::Duration;

use jobpulse::backoff::ReconnectPolicy;
use jobpulse::config::TelemetryConfig;
use jobpulse::error::Error;
use jobpulse::session::TelemetrySession;
use jobpulse::telemetry::{ConnectionState, Transport};
use jobpulse::testkit::api::ScriptedApi;
use jobpulse::testkit::fixtures;
use jobpulse::testkit::stream::NoStreamFactory;

fn polling_config() -> TelemetryConfig {
    TelemetryConfig {
        poll_interval_ms: 20,
        max_samples: 60,
        max_events: 200,
        max_reconnect_attempts: 10,
        enabled: true,
        reconnect: ReconnectPolicy {
            base_delay_ms: 1,
            max_delay_ms: 4,
        },
    }
}

async fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn missing_push_capability_starts_polling_without_attempts() {
    let api = Arc::new(
        ScriptedApi::new()
            .with_repeating_stats(fixtures::aggregate_stats(50, 2))
            .with_repeating_queues(fixtures::queue_page(&["default"])),
    );

    let session = TelemetrySession::new(api.clone(), Arc::new(NoStreamFactory), polling_config());

    assert!(
        wait_for(
            || session.metrics().throughput.len() >= 2,
            Duration::from_secs(2),
        )
        .await
    );

    let connection = session.connection();
    assert_eq!(connection.state, ConnectionState::Connected);
    assert_eq!(connection.transport, Transport::Polling);
    assert_eq!(connection.reconnect_attempt, 0);
    assert!(connection.error.is_none());
    assert!(api.stats_calls() >= 2);

    let metrics = session.metrics();
    assert_eq!(metrics.queue_depths.len(), 1);
    assert_eq!(metrics.total_active_jobs, 2);
    assert_eq!(metrics.total_workers, 4);

    session.disconnect();
}

#[tokio::test]
async fn poll_failure_is_annotated_and_previous_data_retained() {
    // One good tick, then both endpoints start failing.
    let api = ScriptedApi::new()
        .with_stats_results(vec![Ok(fixtures::aggregate_stats(10, 1))])
        .with_queue_results(vec![Ok(fixtures::queue_page(&["default"]))]);

    let session =
        TelemetrySession::new(Arc::new(api), Arc::new(NoStreamFactory), polling_config());

    assert!(
        wait_for(
            || session.connection().state == ConnectionState::Error,
            Duration::from_secs(2),
        )
        .await
    );

    let connection = session.connection();
    assert_eq!(connection.transport, Transport::Polling);
    assert!(connection.error.is_some());

    // Data from the successful tick stays rendered.
    let metrics = session.metrics();
    assert_eq!(metrics.throughput.len(), 1);
    assert_eq!(metrics.queue_depths.len(), 1);

    session.disconnect();
}

#[tokio::test]
async fn queue_listing_failure_does_not_abort_stats_updates() {
    // Stats always succeed; the queue listing never does.
    let api = ScriptedApi::new().with_repeating_stats(fixtures::aggregate_stats(80, 4));

    let session =
        TelemetrySession::new(Arc::new(api), Arc::new(NoStreamFactory), polling_config());

    assert!(
        wait_for(
            || session.metrics().throughput.len() >= 3,
            Duration::from_secs(2),
        )
        .await
    );

    // Throughput keeps flowing even though every tick is annotated with the
    // queue-listing failure.
    let connection = session.connection();
    assert_eq!(connection.state, ConnectionState::Error);
    assert!(connection.error.is_some());
    assert!(session.metrics().queue_depths.is_empty());

    session.disconnect();
}

#[tokio::test]
async fn poll_recovers_on_next_tick_after_failure() {
    let api = ScriptedApi::new()
        .with_stats_results(vec![
            Err(Error::Stream("gateway timeout".into())),
            Ok(fixtures::aggregate_stats(10, 0)),
        ])
        .with_repeating_stats(fixtures::aggregate_stats(20, 0))
        .with_repeating_queues(fixtures::queue_page(&["default"]));

    let session =
        TelemetrySession::new(Arc::new(api), Arc::new(NoStreamFactory), polling_config());

    assert!(
        wait_for(
            || session.connection().state == ConnectionState::Error,
            Duration::from_secs(2),
        )
        .await
    );
    assert!(
        wait_for(
            || session.connection().state == ConnectionState::Connected,
            Duration::from_secs(2),
        )
        .await
    );
    assert!(session.connection().error.is_none());

    session.disconnect();
}
