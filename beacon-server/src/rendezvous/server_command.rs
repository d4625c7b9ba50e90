use beacon_core::{ClientMessage, ConnectionId, DirectorySnapshot, PeerId, SignalBlob, SignalEnvelope};
use tokio::sync::oneshot;

/// Commands fed into the rendezvous event loop by the signalling layer
/// (WebSocket handlers and the admin routes).
#[derive(Debug)]
pub enum ServerCommand {
    /// A channel opened.
    Connect { connection: ConnectionId },

    /// Advertise or replace the offer of `connection`.
    Register {
        connection: ConnectionId,
        id: PeerId,
        alias: String,
        offer: SignalBlob,
    },

    /// Relay an answer to the channel owning `envelope.target_id`.
    Signal {
        connection: ConnectionId,
        envelope: SignalEnvelope,
    },

    /// Empty the directory. `connection` is `None` when triggered by the operator route.
    ClearRooms { connection: Option<ConnectionId> },

    /// A channel closed, cleanly or not.
    Disconnect { connection: ConnectionId },

    /// Read the current directory.
    Snapshot {
        reply: oneshot::Sender<DirectorySnapshot>,
    },
}

impl ServerCommand {
    pub fn from_message(connection: ConnectionId, message: ClientMessage) -> Self {
        match message {
            ClientMessage::Register { id, alias, offer } => ServerCommand::Register {
                connection,
                id,
                alias,
                offer,
            },
            ClientMessage::Signal(envelope) => ServerCommand::Signal {
                connection,
                envelope,
            },
            ClientMessage::ClearRooms => ServerCommand::ClearRooms {
                connection: Some(connection),
            },
        }
    }
}
