//! Telemetry session: transport negotiation, reconnection, and the
//! externally visible snapshots.
//!
//! One session owns one driver task at a time. The driver first runs the
//! stream transport with jittered exponential-backoff retries; when the
//! reconnect budget is spent it switches to polling for the rest of the
//! session and never tries the stream again. At most one of {stream
//! subscription, poll interval, reconnect timer} is alive at any instant,
//! and every await point in the driver is raced against the generation's
//! cancellation token, so nothing fires after `disconnect()`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::AdminApi;
use crate::backoff::reconnect_delay;
use crate::config::TelemetryConfig;
use crate::polling::PollingFallback;
use crate::stream::{JobLifecycleFrame, MetricsFrame, StreamFactory, StreamFrame, TelemetryStream};
use crate::telemetry::aggregator::{PolledReading, SampleAggregator};
use crate::telemetry::events::synthesize_event_id;
use crate::telemetry::{
    ConnectionInfo, EventLog, JobEvent, JobEventKind, MetricsSnapshot, QueueDepth,
};

/// State shared between the session handle and its driver task.
///
/// All mutation funnels through these methods; external consumers only see
/// cloned snapshots.
pub struct SessionShared {
    aggregator: RwLock<SampleAggregator>,
    events: RwLock<EventLog>,
    connection: RwLock<ConnectionInfo>,
}

impl SessionShared {
    fn new(config: &TelemetryConfig) -> Self {
        Self {
            aggregator: RwLock::new(SampleAggregator::new(config.max_samples)),
            events: RwLock::new(EventLog::new(config.max_events)),
            connection: RwLock::new(ConnectionInfo::default()),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.aggregator.read().snapshot()
    }

    pub fn connection(&self) -> ConnectionInfo {
        self.connection.read().clone()
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.events.read().to_vec()
    }

    fn apply_metrics_frame(&self, frame: &MetricsFrame) {
        self.aggregator.write().record_metrics_frame(frame, Utc::now());
    }

    fn record_job_event(&self, kind: JobEventKind, frame: &JobLifecycleFrame) {
        let now = Utc::now();
        self.events.write().push(JobEvent {
            id: synthesize_event_id(now),
            kind,
            job_id: frame.job_id().to_string(),
            job_type: frame.job_type().to_string(),
            queue: frame.queue().to_string(),
            timestamp: frame.timestamp.unwrap_or(now),
            duration_ms: frame.duration,
            error: frame.error.clone(),
            attempt: frame.attempt,
        });
    }

    pub(crate) fn record_polled(&self, reading: &PolledReading) {
        self.aggregator.write().record_polled(reading);
    }

    pub(crate) fn replace_queue_depths(&self, depths: Vec<QueueDepth>) {
        self.aggregator.write().replace_queue_depths(depths);
    }

    fn begin_connecting(&self, attempt: u32) {
        self.connection.write().begin_connecting(attempt);
    }

    fn stream_opened(&self) {
        self.connection.write().stream_opened(Utc::now());
    }

    fn stream_lost(&self, attempt: u32) {
        self.connection.write().stream_lost(attempt);
    }

    fn polling_engaged(&self) {
        self.connection.write().polling_engaged(Utc::now());
    }

    pub(crate) fn poll_succeeded(&self, now: DateTime<Utc>) {
        self.connection.write().poll_succeeded(now);
    }

    pub(crate) fn poll_failed(&self, message: String) {
        self.connection.write().poll_failed(message);
    }

    fn reset_connection(&self) {
        *self.connection.write() = ConnectionInfo::default();
    }
}

struct DriverHandle {
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Resilient telemetry session for one dashboard instance.
///
/// Constructed explicitly with its collaborators injected; there is no
/// ambient singleton. The session activates on construction (when enabled)
/// and tears itself down on drop.
pub struct TelemetrySession {
    shared: Arc<SessionShared>,
    api: Arc<dyn AdminApi>,
    streams: Arc<dyn StreamFactory>,
    config: TelemetryConfig,
    driver: Mutex<DriverHandle>,
}

impl TelemetrySession {
    /// Create the session and, unless disabled, start the driver.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        api: Arc<dyn AdminApi>,
        streams: Arc<dyn StreamFactory>,
        config: TelemetryConfig,
    ) -> Self {
        let session = Self {
            shared: Arc::new(SessionShared::new(&config)),
            api,
            streams,
            config,
            driver: Mutex::new(DriverHandle {
                cancel: None,
                task: None,
            }),
        };
        if session.config.enabled {
            session.start();
        }
        session
    }

    /// Read-only metrics snapshot for rendering.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics()
    }

    /// Read-only connection snapshot.
    pub fn connection(&self) -> ConnectionInfo {
        self.shared.connection()
    }

    /// Read-only, most-recent-first lifecycle event list.
    pub fn events(&self) -> Vec<JobEvent> {
        self.shared.events()
    }

    /// Tear down all active resources and return to the initial
    /// disconnected state. Cancels any pending reconnect timer first; no
    /// timer fires afterwards.
    pub fn disconnect(&self) {
        self.teardown();
        self.shared.reset_connection();
    }

    /// Tear down all active resources, reset the attempt count, and restart
    /// from the stream transport.
    pub fn reconnect(&self) {
        self.teardown();
        self.start();
    }

    /// Disabling tears down all active resources without destroying the
    /// instance; re-enabling restarts from the stream transport.
    pub fn set_enabled(&self, enabled: bool) {
        if enabled {
            let running = self.driver.lock().cancel.is_some();
            if !running {
                self.start();
            }
        } else {
            self.teardown();
        }
    }

    fn start(&self) {
        let mut driver = self.driver.lock();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.api),
            Arc::clone(&self.streams),
            self.config.clone(),
            cancel.clone(),
        ));
        driver.cancel = Some(cancel);
        driver.task = Some(task);
    }

    fn teardown(&self) {
        let mut driver = self.driver.lock();
        if let Some(cancel) = driver.cancel.take() {
            cancel.cancel();
        }
        driver.task.take();
    }
}

impl Drop for TelemetrySession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// One driver generation: stream transport with retries, then permanent
/// polling fallback.
async fn drive(
    shared: Arc<SessionShared>,
    api: Arc<dyn AdminApi>,
    streams: Arc<dyn StreamFactory>,
    config: TelemetryConfig,
    cancel: CancellationToken,
) {
    match streams.create() {
        Some(stream) => {
            if !run_stream_transport(&shared, stream, &config, &cancel).await {
                // Cancelled while streaming or waiting to retry.
                return;
            }
            info!(
                attempts = config.max_reconnect_attempts,
                "reconnect budget exhausted, falling back to polling"
            );
        }
        None => {
            debug!("no push-subscription capability, starting in polling mode");
        }
    }

    if cancel.is_cancelled() {
        return;
    }
    shared.polling_engaged();
    run_polling_transport(&shared, api, &config, &cancel).await;
}

/// Run the stream transport until the reconnect budget is exhausted.
///
/// Returns false when cancelled. The stream resource is closed exactly once
/// per successful open, on whichever path abandons it.
async fn run_stream_transport(
    shared: &SessionShared,
    mut stream: Box<dyn TelemetryStream>,
    config: &TelemetryConfig,
    cancel: &CancellationToken,
) -> bool {
    let mut attempt: u32 = 0;

    loop {
        shared.begin_connecting(attempt);
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            result = stream.connect() => result,
        };

        match connected {
            Ok(()) => {
                attempt = 0;
                shared.stream_opened();
                info!("telemetry stream connected");

                let lost = pump_stream(shared, stream.as_mut(), cancel).await;
                stream.close().await;
                if !lost {
                    return false;
                }
                warn!("telemetry stream lost");
            }
            Err(err) => {
                debug!(error = %err, attempt, "stream open failed");
            }
        }

        if attempt >= config.max_reconnect_attempts {
            return true;
        }

        let delay = reconnect_delay(&config.reconnect, attempt);
        attempt += 1;
        shared.stream_lost(attempt);
        debug!(delay_ms = delay.as_millis() as u64, attempt, "scheduling reconnect");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Demultiplex inbound frames until the connection drops or the session is
/// cancelled. Returns true if the connection was lost.
async fn pump_stream(
    shared: &SessionShared,
    stream: &mut dyn TelemetryStream,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            frame = stream.next_frame() => frame,
        };

        match frame {
            Some(StreamFrame::Metrics(frame)) => shared.apply_metrics_frame(&frame),
            Some(StreamFrame::Lifecycle { kind, frame }) => {
                shared.record_job_event(kind, &frame);
            }
            None => return true,
        }
    }
}

async fn run_polling_transport(
    shared: &SessionShared,
    api: Arc<dyn AdminApi>,
    config: &TelemetryConfig,
    cancel: &CancellationToken,
) {
    let mut poller = PollingFallback::new(api);
    let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => poller.tick(shared).await,
        }
    }
}
