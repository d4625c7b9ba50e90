use crate::rendezvous::ServerCommand;
use crate::signaling::SignalingOutput;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::extract::ws::{Message, Utf8Bytes};
use beacon_core::{ConnectionId, DirectorySnapshot, ServerMessage, SignalEnvelope};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// WebSocket fan-out shared by every connection handler and by the
/// rendezvous loop. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) command_tx: mpsc::Sender<ServerCommand>,
}

impl SignalingService {
    pub fn new(command_tx: mpsc::Sender<ServerCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            command_tx,
        }
    }

    pub fn add_peer(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(connection, tx);
    }

    pub fn remove_peer(&self, connection: &ConnectionId) {
        self.inner.peers.remove(connection);
    }

    pub fn connected_peers(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn send_signal(&self, connection: ConnectionId, msg: &ServerMessage) {
        match msg.encode() {
            Ok(json) => self.send_text(connection, json.into()),
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    /// Tell a client its last message was discarded.
    pub fn send_rejection(&self, connection: ConnectionId, reason: String) {
        self.send_signal(connection, &ServerMessage::Rejected { reason });
    }

    fn send_text(&self, connection: ConnectionId, text: Utf8Bytes) {
        if let Some(peer) = self.inner.peers.get(&connection) {
            if let Err(e) = peer.send(Message::Text(text)) {
                error!("Failed to send WS message to {}: {:?}", connection, e);
            }
        } else {
            warn!("Attempted to send signal to disconnected channel {}", connection);
        }
    }

    /// Submit a command to the rendezvous loop.
    pub async fn submit(&self, cmd: ServerCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .context("rendezvous server is not running")
    }

    /// Current directory, read through the rendezvous loop.
    pub async fn directory(&self) -> Result<DirectorySnapshot> {
        let (reply, rx) = oneshot::channel();
        self.submit(ServerCommand::Snapshot { reply }).await?;
        rx.await.context("rendezvous server dropped the snapshot request")
    }

    /// Operator reset of the directory.
    pub async fn clear_directory(&self) -> Result<()> {
        self.submit(ServerCommand::ClearRooms { connection: None })
            .await
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_directory(&self, connection: ConnectionId, snapshot: DirectorySnapshot) {
        self.send_signal(connection, &ServerMessage::Clients(snapshot));
    }

    async fn send_answer(&self, connection: ConnectionId, envelope: SignalEnvelope) {
        self.send_signal(connection, &ServerMessage::Signal(envelope));
    }

    async fn broadcast_directory(&self, connections: &[ConnectionId], snapshot: DirectorySnapshot) {
        let json = match ServerMessage::Clients(snapshot).encode() {
            Ok(json) => Utf8Bytes::from(json),
            Err(e) => {
                error!("Failed to serialize directory: {}", e);
                return;
            }
        };

        for connection in connections {
            self.send_text(*connection, json.clone());
        }
    }
}
