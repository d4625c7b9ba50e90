use crate::registry::Registry;
use crate::rendezvous::server_command::ServerCommand;
use crate::signaling::SignalingOutput;
use beacon_core::{ConnectionId, PeerId, SignalBlob, SignalEnvelope};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Upper bound on queued commands folded into one directory broadcast.
pub const DEFAULT_COALESCE_LIMIT: usize = 64;

/// The rendezvous actor.
///
/// Sole owner of the [`Registry`] and of the set of open channels. Every
/// mutation and every outbound signal is a reaction to one [`ServerCommand`],
/// processed in arrival order.
pub struct RendezvousServer {
    registry: Registry,

    /// Channels that are open right now. Outlives [`Registry::clear`], which
    /// drops registrations but not connections.
    connections: HashSet<ConnectionId>,

    command_rx: mpsc::Receiver<ServerCommand>,

    signaling: Arc<dyn SignalingOutput>,

    coalesce_limit: usize,
}

impl RendezvousServer {
    pub fn new(command_rx: mpsc::Receiver<ServerCommand>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry: Registry::new(),
            connections: HashSet::new(),
            command_rx,
            signaling,
            coalesce_limit: DEFAULT_COALESCE_LIMIT,
        }
    }

    /// How many already-queued commands may be applied before a pending
    /// directory broadcast goes out. `0` broadcasts after every mutation.
    pub fn with_coalesce_limit(mut self, limit: usize) -> Self {
        self.coalesce_limit = limit;
        self
    }

    /// Event loop. Runs until every command sender is dropped; spawn it with
    /// `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Rendezvous event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            let mut dirty = self.handle_command(cmd).await;

            if dirty {
                let mut folded = 0;
                while folded < self.coalesce_limit {
                    let Ok(next) = self.command_rx.try_recv() else {
                        break;
                    };
                    dirty |= self.handle_command(next).await;
                    folded += 1;
                }

                if folded > 0 {
                    debug!("Folded {} queued commands into one broadcast", folded);
                }
                self.broadcast_directory().await;
            }
        }

        info!("Command channel closed. Rendezvous event loop finished");
    }

    /// Apply one command. Returns `true` when the directory changed and must
    /// be rebroadcast.
    async fn handle_command(&mut self, cmd: ServerCommand) -> bool {
        match cmd {
            ServerCommand::Connect { connection } => {
                self.on_connect(connection).await;
                false
            }

            ServerCommand::Register {
                connection,
                id,
                alias,
                offer,
            } => self.on_register(connection, id, alias, offer),

            ServerCommand::Signal {
                connection,
                envelope,
            } => {
                self.on_signal(connection, envelope).await;
                false
            }

            ServerCommand::ClearRooms { connection } => {
                let dropped = self.registry.clear();
                match connection {
                    Some(connection) => {
                        info!("Directory cleared by {} ({} sessions dropped)", connection, dropped)
                    }
                    None => info!("Directory cleared by operator ({} sessions dropped)", dropped),
                }
                true
            }

            ServerCommand::Disconnect { connection } => self.on_disconnect(connection),

            ServerCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
                false
            }
        }
    }

    async fn on_connect(&mut self, connection: ConnectionId) {
        info!("Channel {} connected", connection);

        self.connections.insert(connection);
        self.registry.open(connection);

        // A late joiner sees existing peers before advertising itself.
        self.signaling
            .send_directory(connection, self.registry.snapshot())
            .await;
    }

    fn on_register(
        &mut self,
        connection: ConnectionId,
        id: PeerId,
        alias: String,
        offer: SignalBlob,
    ) -> bool {
        if !self.connections.contains(&connection) {
            warn!("Ignoring register from closed channel {}", connection);
            return false;
        }

        info!("Channel {} advertises {} ({:?})", connection, id, alias);
        self.registry.upsert_offer(connection, id, alias, offer);
        true
    }

    async fn on_signal(&mut self, connection: ConnectionId, envelope: SignalEnvelope) {
        let target = self
            .registry
            .owner_of(&envelope.target_id)
            .filter(|target| self.connections.contains(target));

        let Some(target) = target else {
            debug!(
                "Dropping answer from {} for unknown peer {}",
                connection, envelope.target_id
            );
            return;
        };

        info!(
            "Relaying answer from {} to {} ({})",
            connection, envelope.target_id, target
        );
        self.signaling.send_answer(target, envelope).await;
    }

    fn on_disconnect(&mut self, connection: ConnectionId) -> bool {
        let was_open = self.connections.remove(&connection);
        let session = self.registry.remove(&connection);

        info!("Channel {} disconnected", connection);

        // Every close is rebroadcast, advertising or not.
        was_open || session.is_some()
    }

    async fn broadcast_directory(&self) {
        let snapshot = self.registry.snapshot();
        let targets: Vec<ConnectionId> = self.connections.iter().copied().collect();

        debug!(
            "Broadcasting directory of {} peers to {} channels",
            snapshot.len(),
            targets.len()
        );
        self.signaling.broadcast_directory(&targets, snapshot).await;
    }
}
