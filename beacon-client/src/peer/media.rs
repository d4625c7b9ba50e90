use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use webrtc::track::track_local::TrackLocal;

/// Local media handed to every new peer connection.
#[derive(Clone, Default)]
pub struct LocalStream {
    pub tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl LocalStream {
    /// No tracks. Sessions carry a data channel only.
    pub fn data_only() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture device available")]
    NoDevice,

    #[error("capture permission denied")]
    Denied,

    #[error("capture failed: {0}")]
    Failed(String),
}

/// Source of the local stream, queried once per client.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn capture(&self) -> Result<LocalStream, CaptureError>;
}

/// Data-only capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

#[async_trait]
impl MediaCapture for NoMedia {
    async fn capture(&self) -> Result<LocalStream, CaptureError> {
        Ok(LocalStream::data_only())
    }
}
