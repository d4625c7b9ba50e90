use crate::peer::media::LocalStream;
use async_trait::async_trait;
use beacon_core::SignalBlob;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;
use webrtc::data_channel::RTCDataChannel;
use webrtc::track::track_remote::TrackRemote;

/// One connection attempt. Events from a discarded attempt carry a stale id
/// and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote stream that became usable.
#[derive(Clone)]
pub enum RemoteStream {
    Track(Arc<TrackRemote>),
    DataChannel(Arc<RTCDataChannel>),
    /// Handle produced by a non-webrtc capability.
    Other(Arc<dyn Any + Send + Sync>),
}

impl RemoteStream {
    pub fn label(&self) -> String {
        match self {
            RemoteStream::Track(track) => format!("track:{}", track.kind()),
            RemoteStream::DataChannel(channel) => format!("data:{}", channel.label()),
            RemoteStream::Other(_) => "other".to_owned(),
        }
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteStream").field(&self.label()).finish()
    }
}

/// Callbacks of a capability, posted to the owner's queue.
#[derive(Debug, Clone)]
pub enum CapabilityEvent {
    LocalOffer(AttemptId, SignalBlob),
    LocalAnswer(AttemptId, SignalBlob),
    StreamReady(AttemptId, RemoteStream),
    Failed(AttemptId, String),
}

impl CapabilityEvent {
    pub fn attempt(&self) -> AttemptId {
        match self {
            CapabilityEvent::LocalOffer(attempt, _)
            | CapabilityEvent::LocalAnswer(attempt, _)
            | CapabilityEvent::StreamReady(attempt, _)
            | CapabilityEvent::Failed(attempt, _) => *attempt,
        }
    }
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("remote description rejected: {0}")]
    InvalidRemote(String),

    #[error("capability is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// The peer-connection half of one attempt.
#[async_trait]
pub trait PeerCapability: Send + Sync {
    /// Feed the remote half of the handshake: the offer for an answerer, the
    /// answer for an offerer. An answerer reports its own answer later as
    /// [`CapabilityEvent::LocalAnswer`].
    async fn signal(&self, remote: SignalBlob) -> Result<(), CapabilityError>;

    async fn close(&self);
}

#[async_trait]
pub trait CapabilityFactory: Send + Sync {
    /// Open a capability for `attempt`. An initiator starts generating its
    /// offer immediately and reports it as [`CapabilityEvent::LocalOffer`].
    async fn open(
        &self,
        attempt: AttemptId,
        initiator: bool,
        stream: LocalStream,
        events: mpsc::UnboundedSender<CapabilityEvent>,
    ) -> Result<Box<dyn PeerCapability>, CapabilityError>;
}
