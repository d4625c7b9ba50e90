use beacon_core::{ConnectionId, DirectorySnapshot, SignalEnvelope};
use async_trait::async_trait;

/// Outbound side of the signalling channels. The rendezvous loop talks to
/// clients only through this trait, so it can run against a WebSocket fan-out
/// or a test double.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Push a full directory to one channel.
    async fn send_directory(&self, connection: ConnectionId, snapshot: DirectorySnapshot);

    /// Deliver a relayed answer to one channel.
    async fn send_answer(&self, connection: ConnectionId, envelope: SignalEnvelope);

    /// Push the same directory to every channel in `connections`.
    async fn broadcast_directory(&self, connections: &[ConnectionId], snapshot: DirectorySnapshot) {
        for connection in connections {
            self.send_directory(*connection, snapshot.clone()).await;
        }
    }
}
