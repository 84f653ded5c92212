use facetrack_core::{ConfigError, Detection, FaceTracker, TrackStatistics, TrackerConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid tracker config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn tracker thread for stream {stream}: {source}")]
    Spawn {
        stream: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tracker thread for stream {0} exited")]
    ChannelClosed(String),
}

/// Output of one processed frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// 1-based frame number within the stream.
    pub frame: u64,
    pub faces: Vec<Detection>,
}

/// Messages sent to a stream's tracker thread.
enum TrackerRequest {
    Process {
        detections: Vec<Detection>,
        reply: oneshot::Sender<FrameResult>,
    },
    Statistics {
        reply: oneshot::Sender<TrackStatistics>,
    },
}

/// Clone-safe handle to one stream's tracker thread.
#[derive(Clone)]
pub struct TrackerHandle {
    stream: Arc<str>,
    tx: mpsc::Sender<TrackerRequest>,
}

impl TrackerHandle {
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Run the tracker over one frame of detections.
    pub async fn process(&self, detections: Vec<Detection>) -> Result<FrameResult, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerRequest::Process {
                detections,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.closed())?;
        reply_rx.await.map_err(|_| self.closed())
    }

    pub async fn statistics(&self) -> Result<TrackStatistics, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerRequest::Statistics { reply: reply_tx })
            .await
            .map_err(|_| self.closed())?;
        reply_rx.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> EngineError {
        EngineError::ChannelClosed(self.stream.to_string())
    }
}

/// Spawn a tracker for `stream` on a dedicated OS thread.
///
/// The thread owns the stream's [`FaceTracker`] and handles requests one at a
/// time until every handle is dropped.
pub fn spawn_tracker(
    stream: &str,
    config: TrackerConfig,
    channel_capacity: usize,
) -> Result<TrackerHandle, EngineError> {
    let mut tracker = FaceTracker::new(config)?;
    let (tx, mut rx) = mpsc::channel::<TrackerRequest>(channel_capacity.max(1));
    let stream: Arc<str> = Arc::from(stream);
    let thread_stream = Arc::clone(&stream);

    std::thread::Builder::new()
        .name(format!("facetrack-{stream}"))
        .spawn(move || {
            tracing::info!(stream = %thread_stream, "tracker thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    TrackerRequest::Process { detections, reply } => {
                        let faces = tracker.update(detections);
                        let _ = reply.send(FrameResult {
                            frame: tracker.frame_count(),
                            faces,
                        });
                    }
                    TrackerRequest::Statistics { reply } => {
                        let _ = reply.send(tracker.statistics());
                    }
                }
            }
            tracing::info!(
                stream = %thread_stream,
                frames = tracker.frame_count(),
                "tracker thread exiting"
            );
        })
        .map_err(|source| EngineError::Spawn {
            stream: stream.to_string(),
            source,
        })?;

    Ok(TrackerHandle { stream, tx })
}

/// Lazily spawned trackers, one per stream id.
pub struct Engines {
    config: TrackerConfig,
    channel_capacity: usize,
    handles: BTreeMap<String, TrackerHandle>,
}

impl Engines {
    pub fn new(config: TrackerConfig, channel_capacity: usize) -> Self {
        Self {
            config,
            channel_capacity,
            handles: BTreeMap::new(),
        }
    }

    /// Handle for `stream`, spawning its tracker on first use.
    pub fn get_or_spawn(&mut self, stream: &str) -> Result<TrackerHandle, EngineError> {
        if let Some(handle) = self.handles.get(stream) {
            return Ok(handle.clone());
        }

        let handle = spawn_tracker(stream, self.config.clone(), self.channel_capacity)?;
        tracing::info!(stream, streams = self.handles.len() + 1, "new stream");
        self.handles.insert(stream.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Handles in stream-id order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackerHandle> {
        self.handles.values()
    }
}
