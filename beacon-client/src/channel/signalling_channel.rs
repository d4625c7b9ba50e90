use async_trait::async_trait;
use beacon_core::{ClientMessage, ServerMessage};
use thiserror::Error;

/// What the client observes on its signalling channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Connected,
    Message(ServerMessage),
    /// The channel is gone; nothing more will arrive.
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to reach rendezvous server: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("signalling channel is closed")]
    Closed,
}

/// Client half of the signalling transport: reliable, ordered, full duplex.
/// Inbound traffic is delivered as [`ChannelEvent`]s through the receiver
/// handed out when the channel is opened.
#[async_trait]
pub trait SignallingChannel: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> Result<(), ChannelError>;

    async fn close(&self);
}
