//! SSE implementation of [`TelemetryStream`] over a reqwest byte stream.
//!
//! Frames arrive as `event:`/`data:` blocks separated by a blank line. A
//! block that fails to parse is logged at debug and dropped; the connection
//! itself only ends when the transport does.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::frames::{JobLifecycleFrame, MetricsFrame, StreamFrame};
use super::{StreamFactory, TelemetryStream};
use crate::error::Result;
use crate::telemetry::JobEventKind;

type BodyStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

pub struct SseStream {
    client: Client,
    url: Url,
    body: Option<BodyStream>,
    buffer: Vec<u8>,
}

impl SseStream {
    pub fn new(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            body: None,
            buffer: Vec::new(),
        }
    }
}

#[async_trait]
impl TelemetryStream for SseStream {
    async fn connect(&mut self) -> Result<()> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        self.buffer.clear();
        self.body = Some(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())),
        ));
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<StreamFrame> {
        loop {
            while let Some(block) = take_event_block(&mut self.buffer) {
                if let Some(frame) = parse_event_block(&block) {
                    return Some(frame);
                }
            }

            let body = self.body.as_mut()?;
            match body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    debug!(error = %err, "SSE body error");
                    return None;
                }
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        self.body = None;
        self.buffer.clear();
    }
}

/// Pop the next complete event block (up to a blank line) off the buffer.
fn take_event_block(buffer: &mut Vec<u8>) -> Option<String> {
    let lf = find_subsequence(buffer, b"\n\n").map(|i| (i, 2));
    let crlf = find_subsequence(buffer, b"\r\n\r\n").map(|i| (i, 4));
    let (at, sep_len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    let block = String::from_utf8_lossy(&buffer[..at]).into_owned();
    buffer.drain(..at + sep_len);
    Some(block)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse one `event:`/`data:` block into a frame, or discard it.
fn parse_event_block(block: &str) -> Option<StreamFrame> {
    let mut event_name = "message";
    let mut data = String::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event_name = rest.trim();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // `id:`, `retry:` and comment lines are irrelevant here.
    }

    if data.is_empty() {
        return None;
    }
    decode_frame(event_name, &data)
}

/// Demultiplex by event name. Unknown names and malformed payloads are
/// dropped without touching connection state.
pub(crate) fn decode_frame(event_name: &str, data: &str) -> Option<StreamFrame> {
    if event_name == "metrics" {
        return match serde_json::from_str::<MetricsFrame>(data) {
            Ok(frame) => Some(StreamFrame::Metrics(frame)),
            Err(err) => {
                debug!(error = %err, "discarding malformed metrics frame");
                None
            }
        };
    }

    if let Some(kind) = JobEventKind::from_event_name(event_name) {
        return match serde_json::from_str::<JobLifecycleFrame>(data) {
            Ok(frame) => Some(StreamFrame::Lifecycle { kind, frame }),
            Err(err) => {
                debug!(error = %err, "discarding malformed lifecycle frame");
                None
            }
        };
    }

    None
}

/// Factory producing one [`SseStream`] per driver generation.
pub struct SseStreamFactory {
    client: Client,
    url: Url,
}

impl SseStreamFactory {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

impl StreamFactory for SseStreamFactory {
    fn create(&self) -> Option<Box<dyn TelemetryStream>> {
        Some(Box::new(SseStream::new(
            self.client.clone(),
            self.url.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_blocks_on_blank_lines() {
        let mut buffer = b"event: metrics\ndata: {}\n\nevent: job.failed\ndata: {\"job_id\":\"j\"}\n\npartial".to_vec();

        assert_eq!(
            take_event_block(&mut buffer).as_deref(),
            Some("event: metrics\ndata: {}")
        );
        assert_eq!(
            take_event_block(&mut buffer).as_deref(),
            Some("event: job.failed\ndata: {\"job_id\":\"j\"}")
        );
        assert!(take_event_block(&mut buffer).is_none());
        assert_eq!(buffer, b"partial");
    }

    #[test]
    fn handles_crlf_delimiters() {
        let mut buffer = b"event: metrics\r\ndata: {\"queues\": []}\r\n\r\n".to_vec();
        let block = take_event_block(&mut buffer).unwrap();
        assert!(parse_event_block(&block).is_some());
        assert!(buffer.is_empty());
    }

    #[test]
    fn metrics_block_decodes() {
        let block = "event: metrics\ndata: {\"queues\": [], \"error_rate\": 0.5}";
        match parse_event_block(block) {
            Some(StreamFrame::Metrics(frame)) => assert_eq!(frame.error_rate, 0.5),
            other => panic!("expected metrics frame, got {other:?}"),
        }
    }

    #[test]
    fn lifecycle_block_decodes_with_kind() {
        let block = "event: job.completed\ndata: {\"job_id\": \"j-1\", \"duration\": 42}";
        match parse_event_block(block) {
            Some(StreamFrame::Lifecycle { kind, frame }) => {
                assert_eq!(kind, JobEventKind::Completed);
                assert_eq!(frame.job_id(), "j-1");
                assert_eq!(frame.duration, Some(42));
            }
            other => panic!("expected lifecycle frame, got {other:?}"),
        }
    }

    #[test]
    fn multi_line_data_is_joined() {
        let block = "event: metrics\ndata: {\"queues\": [],\ndata: \"error_rate\": 2.0}";
        match parse_event_block(block) {
            Some(StreamFrame::Metrics(frame)) => assert_eq!(frame.error_rate, 2.0),
            other => panic!("expected metrics frame, got {other:?}"),
        }
    }

    #[test]
    fn malformed_and_unknown_blocks_are_discarded() {
        assert!(parse_event_block("event: metrics\ndata: not json").is_none());
        assert!(parse_event_block("event: worker.joined\ndata: {}").is_none());
        assert!(parse_event_block(": keepalive comment").is_none());
        assert!(parse_event_block("event: metrics").is_none());
    }
}
