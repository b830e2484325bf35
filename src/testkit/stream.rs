//! Mock [`TelemetryStream`] implementations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::stream::{StreamFactory, StreamFrame, TelemetryStream};

/// Shared counters for asserting resource lifecycle from the outside.
#[derive(Clone, Default)]
pub struct StreamProbe {
    connects: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl StreamProbe {
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

/// A mock stream with scripted connect results and a fixed frame queue.
///
/// Each `connect()` pops the next result (defaulting to `Ok(())` when
/// exhausted). When the frame queue drains, `next_frame` either reports the
/// connection as lost (`None`) or, with `silent_when_empty`, blocks forever
/// to simulate a healthy but quiet subscription.
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    frames: VecDeque<StreamFrame>,
    silent_when_empty: bool,
    probe: StreamProbe,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            frames: VecDeque::new(),
            silent_when_empty: false,
            probe: StreamProbe::default(),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_frames(mut self, frames: Vec<StreamFrame>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Keep the connection alive (but silent) once the frames run out.
    pub fn silent_when_empty(mut self) -> Self {
        self.silent_when_empty = true;
        self
    }

    pub fn probe(&self) -> StreamProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_frame(&mut self) -> Option<StreamFrame> {
        match self.frames.pop_front() {
            Some(frame) => {
                // Yield so consumers observe frames one loop turn at a time.
                tokio::task::yield_now().await;
                Some(frame)
            }
            None if self.silent_when_empty => std::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory handing out pre-built [`ScriptedStream`]s, one per driver
/// generation. Once drained it reports no push capability.
pub struct ScriptedFactory {
    streams: Mutex<VecDeque<ScriptedStream>>,
}

impl ScriptedFactory {
    pub fn new(streams: Vec<ScriptedStream>) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
        }
    }
}

impl StreamFactory for ScriptedFactory {
    fn create(&self) -> Option<Box<dyn TelemetryStream>> {
        self.streams
            .lock()
            .pop_front()
            .map(|s| Box::new(s) as Box<dyn TelemetryStream>)
    }
}

/// A runtime with no push-subscription capability at all.
pub struct NoStreamFactory;

impl StreamFactory for NoStreamFactory {
    fn create(&self) -> Option<Box<dyn TelemetryStream>> {
        None
    }
}
