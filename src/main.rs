use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;

use jobpulse::api::AdminClient;
use jobpulse::config::Config;
use jobpulse::session::TelemetrySession;
use jobpulse::stream::SseStreamFactory;

const CONFIG_PATH: &str = "jobpulse.toml";

#[tokio::main]
async fn main() {
    let config = if std::path::Path::new(CONFIG_PATH).exists() {
        match Config::load(CONFIG_PATH) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    config.init_logging();
    info!(api_url = %config.network.api_url, "jobpulse starting");

    let session = match build_session(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            std::process::exit(1);
        }
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let connection = session.connection();
                let metrics = session.metrics();
                info!(
                    state = ?connection.state,
                    transport = ?connection.transport,
                    reconnect_attempt = connection.reconnect_attempt,
                    queues = metrics.queue_depths.len(),
                    samples = metrics.throughput.len(),
                    active_jobs = metrics.total_active_jobs,
                    workers = metrics.total_workers,
                    events = session.events().len(),
                    "telemetry snapshot"
                );
            }
        }
    }

    session.disconnect();
    info!("jobpulse stopped");
}

fn build_session(config: &Config) -> anyhow::Result<TelemetrySession> {
    let api = Arc::new(AdminClient::new(&config.network.api_url)?);
    let stream_url =
        url::Url::parse(&config.network.api_url)?.join(&config.network.stream_path)?;
    let streams = Arc::new(SseStreamFactory::new(reqwest::Client::new(), stream_url));
    Ok(TelemetrySession::new(api, streams, config.telemetry.clone()))
}
