use crate::peer::{AttemptId, RemoteStream};
use beacon_core::{DirectorySnapshot, PeerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// What the controller reports to its host.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    StatusChanged(ConnectionStatus),

    DirectoryUpdated(DirectorySnapshot),

    /// Our offer is in the directory.
    OfferRegistered(AttemptId),

    /// Our answer to `remote` went out.
    AnswerSent { attempt: AttemptId, remote: PeerId },

    StreamReady {
        attempt: AttemptId,
        /// `None` on the offerer side: the answerer never identifies itself.
        remote: Option<PeerId>,
        stream: RemoteStream,
    },

    AttemptFailed { attempt: AttemptId, reason: String },

    /// Local capture failed; sessions continue without media.
    CaptureFailed(String),

    /// The server discarded one of our messages.
    Rejected(String),

    CommandFailed(String),
}
