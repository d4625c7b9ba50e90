use crate::channel::{ChannelError, ChannelEvent, SignallingChannel};
use crate::controller::client_command::ClientCommand;
use crate::controller::client_config::ClientConfig;
use crate::controller::client_event::{ClientEvent, ConnectionStatus};
use crate::controller::local_identity::LocalIdentity;
use crate::peer::{
    AdapterState, AttemptId, CapabilityError, CapabilityEvent, CapabilityFactory, LocalStream,
    MediaCapture, PeerConnectionAdapter,
};
use beacon_core::{ClientMessage, DirectorySnapshot, PeerId, ServerMessage, SignalEnvelope};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("not connected to the rendezvous server")]
    NotConnected,

    #[error("peer {0} is not in the directory")]
    UnknownPeer(PeerId),

    #[error("cannot answer our own offer")]
    OwnOffer,

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Client side of the rendezvous protocol.
///
/// Owns every adapter of this client: at most one offerer (our room) and any
/// number of answerers (rooms we joined). All state changes happen on the
/// task that drives [`ClientController::run`], one event at a time.
pub struct ClientController {
    identity: LocalIdentity,
    config: ClientConfig,
    status: ConnectionStatus,
    directory: DirectorySnapshot,

    offerer: Option<PeerConnectionAdapter>,
    answerers: HashMap<AttemptId, PeerConnectionAdapter>,
    /// Handshake deadlines of attempts that are still negotiating.
    deadlines: HashMap<AttemptId, Instant>,

    /// Captured on first use and shared by every attempt.
    local_stream: Option<LocalStream>,

    channel: Arc<dyn SignallingChannel>,
    factory: Arc<dyn CapabilityFactory>,
    media: Arc<dyn MediaCapture>,

    capability_tx: mpsc::UnboundedSender<CapabilityEvent>,
    capability_rx: mpsc::UnboundedReceiver<CapabilityEvent>,

    event_tx: mpsc::UnboundedSender<ClientEvent>,
}

impl ClientController {
    pub fn new(
        identity: LocalIdentity,
        channel: Arc<dyn SignallingChannel>,
        factory: Arc<dyn CapabilityFactory>,
        media: Arc<dyn MediaCapture>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (capability_tx, capability_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let controller = Self {
            identity,
            config: ClientConfig::default(),
            status: ConnectionStatus::Connecting,
            directory: DirectorySnapshot::empty(),
            offerer: None,
            answerers: HashMap::new(),
            deadlines: HashMap::new(),
            local_stream: None,
            channel,
            factory,
            media,
            capability_tx,
            capability_rx,
            event_tx,
        };

        (controller, event_rx)
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Last directory received from the server.
    pub fn directory(&self) -> &DirectorySnapshot {
        &self.directory
    }

    pub fn offerer(&self) -> Option<&PeerConnectionAdapter> {
        self.offerer.as_ref()
    }

    pub fn answerer(&self, attempt: AttemptId) -> Option<&PeerConnectionAdapter> {
        self.answerers.get(&attempt)
    }

    pub fn answerer_count(&self) -> usize {
        self.answerers.len()
    }

    /// Takes effect on the next [`ClientController::create_room`].
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.identity.alias = alias.into();
        debug!("Alias set to {:?}", self.identity.alias);
    }

    /// Open a new offerer. Any previous offerer is closed and its late events
    /// are ignored.
    pub async fn create_room(&mut self) -> Result<AttemptId, ControllerError> {
        if self.status != ConnectionStatus::Connected {
            return Err(ControllerError::NotConnected);
        }

        if let Some(stale) = self.offerer.take() {
            info!("Discarding offer attempt {}", stale.attempt());
            self.deadlines.remove(&stale.attempt());
            stale.close().await;
        }

        let attempt = AttemptId::new();
        let stream = self.local_stream().await;
        let capability = self
            .factory
            .open(attempt, true, stream, self.capability_tx.clone())
            .await?;

        info!("Creating room as {} (attempt {})", self.identity.id, attempt);
        self.offerer = Some(PeerConnectionAdapter::offerer(attempt, capability));
        self.arm_deadline(attempt);
        Ok(attempt)
    }

    /// Answer the offer `peer` advertises in the current directory.
    pub async fn connect_to(&mut self, peer: &PeerId) -> Result<AttemptId, ControllerError> {
        if self.status != ConnectionStatus::Connected {
            return Err(ControllerError::NotConnected);
        }
        if *peer == self.identity.id {
            return Err(ControllerError::OwnOffer);
        }

        let entry = self
            .directory
            .get(peer)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownPeer(peer.clone()))?;

        let attempt = AttemptId::new();
        let stream = self.local_stream().await;
        let capability = self
            .factory
            .open(attempt, false, stream, self.capability_tx.clone())
            .await?;

        info!("Answering {} ({:?}) in attempt {}", entry.id, entry.alias, attempt);
        let adapter = PeerConnectionAdapter::answerer(attempt, &entry, capability).await;

        if adapter.is_failed() {
            let reason = adapter.failure().unwrap_or("offer refused").to_owned();
            adapter.close().await;
            self.emit(ClientEvent::AttemptFailed { attempt, reason });
        } else {
            self.answerers.insert(attempt, adapter);
            self.arm_deadline(attempt);
        }
        Ok(attempt)
    }

    /// Ask the server to drop every registration.
    pub async fn clear_rooms(&mut self) -> Result<(), ControllerError> {
        self.channel.send(ClientMessage::ClearRooms).await?;
        Ok(())
    }

    pub async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => self.set_status(ConnectionStatus::Connected),

            ChannelEvent::Disconnected => {
                self.set_status(ConnectionStatus::Disconnected);
                self.fail_orphaned_attempts().await;
            }

            ChannelEvent::Message(ServerMessage::Clients(snapshot)) => {
                debug!("Directory now lists {} peers", snapshot.len());
                self.directory = snapshot.clone();
                self.emit(ClientEvent::DirectoryUpdated(snapshot));
            }

            ChannelEvent::Message(ServerMessage::Signal(envelope)) => {
                self.on_remote_answer(envelope).await
            }

            ChannelEvent::Message(ServerMessage::Rejected { reason }) => {
                warn!("Server rejected our message: {}", reason);
                self.emit(ClientEvent::Rejected(reason));
            }
        }
    }

    pub async fn handle_capability_event(&mut self, event: CapabilityEvent) {
        let attempt = event.attempt();
        let identity = self.identity.clone();

        let Some(adapter) = self.adapter_mut(attempt) else {
            debug!("Dropping event of discarded attempt {}", attempt);
            return;
        };

        match event {
            CapabilityEvent::LocalOffer(_, offer) => {
                if let Some(msg) = adapter.on_local_offer(&identity.id, &identity.alias, offer) {
                    // Waiting in the room for an answer has no deadline.
                    self.deadlines.remove(&attempt);
                    self.send_for(attempt, msg, ClientEvent::OfferRegistered(attempt))
                        .await;
                }
            }

            CapabilityEvent::LocalAnswer(_, answer) => {
                let remote = adapter.remote().cloned();
                if let (Some(msg), Some(remote)) = (adapter.on_local_answer(answer), remote) {
                    self.send_for(attempt, msg, ClientEvent::AnswerSent { attempt, remote })
                        .await;
                }
            }

            CapabilityEvent::StreamReady(_, stream) => {
                if adapter.on_stream_ready(&stream) {
                    let remote = adapter.remote().cloned();
                    self.deadlines.remove(&attempt);
                    self.emit(ClientEvent::StreamReady {
                        attempt,
                        remote,
                        stream,
                    });
                }
            }

            CapabilityEvent::Failed(_, reason) => self.fail_attempt(attempt, reason).await,
        }
    }

    /// Returns `false` once the controller should stop.
    pub async fn handle_command(&mut self, command: ClientCommand) -> bool {
        let result = match command {
            ClientCommand::CreateRoom => self.create_room().await.map(|_| ()),
            ClientCommand::ConnectTo(peer) => self.connect_to(&peer).await.map(|_| ()),
            ClientCommand::SetAlias(alias) => {
                self.set_alias(alias);
                Ok(())
            }
            ClientCommand::ClearRooms => self.clear_rooms().await,
            ClientCommand::Shutdown => return false,
        };

        if let Err(e) = result {
            warn!("Command failed: {}", e);
            self.emit(ClientEvent::CommandFailed(e.to_string()));
        }
        true
    }

    /// Event loop. Runs until `Shutdown` arrives or every command sender is
    /// dropped, then closes all attempts and the channel.
    pub async fn run(
        mut self,
        mut channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
        mut commands: mpsc::Receiver<ClientCommand>,
    ) {
        info!("Client {} event loop started", self.identity.id);
        let mut channel_open = true;

        loop {
            let next_deadline = self.deadlines.values().min().copied();

            tokio::select! {
                event = channel_events.recv(), if channel_open => match event {
                    Some(event) => self.handle_channel_event(event).await,
                    None => {
                        channel_open = false;
                        self.handle_channel_event(ChannelEvent::Disconnected).await;
                    }
                },

                _ = tokio::time::sleep_until(next_deadline.unwrap_or_else(Instant::now)),
                    if next_deadline.is_some() =>
                {
                    self.expire_handshakes().await;
                }

                Some(event) = self.capability_rx.recv() => {
                    self.handle_capability_event(event).await;
                }

                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        self.shutdown().await;
        info!("Client {} event loop finished", self.identity.id);
    }

    pub async fn shutdown(&mut self) {
        if let Some(offerer) = self.offerer.take() {
            offerer.close().await;
        }
        for (_, adapter) in self.answerers.drain() {
            adapter.close().await;
        }
        self.deadlines.clear();
        self.channel.close().await;
    }

    async fn on_remote_answer(&mut self, envelope: SignalEnvelope) {
        if envelope.target_id != self.identity.id {
            debug!("Ignoring answer addressed to {}", envelope.target_id);
            return;
        }

        let Some(offerer) = self.offerer.as_mut() else {
            debug!("Ignoring answer: no open offer");
            return;
        };

        let attempt = offerer.attempt();
        let was_waiting = offerer.state() == AdapterState::AwaitingAnswer;
        match offerer.on_remote_answer(envelope.answer).await {
            Ok(()) => {
                if was_waiting && offerer.state() == AdapterState::Answered {
                    self.arm_deadline(attempt);
                }
            }
            Err(e) => self.fail_attempt(attempt, e.to_string()).await,
        }
    }

    /// Fail every attempt whose handshake deadline has passed.
    pub async fn expire_handshakes(&mut self) {
        let now = Instant::now();
        let expired: Vec<AttemptId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(attempt, _)| *attempt)
            .collect();

        for attempt in expired {
            warn!("Attempt {} did not connect in time", attempt);
            self.fail_attempt(attempt, "handshake timed out".to_owned())
                .await;
        }
    }

    /// Fail the attempts that still need the server: the offerer unless
    /// connected, and answerers that have not sent their answer.
    async fn fail_orphaned_attempts(&mut self) {
        let mut orphaned: Vec<AttemptId> = self
            .answerers
            .values()
            .filter(|adapter| adapter.state() == AdapterState::Negotiating)
            .map(PeerConnectionAdapter::attempt)
            .collect();
        if let Some(offerer) = &self.offerer {
            if offerer.state() != AdapterState::Connected {
                orphaned.push(offerer.attempt());
            }
        }

        for attempt in orphaned {
            self.fail_attempt(attempt, "signalling channel closed".to_owned())
                .await;
        }
    }

    fn arm_deadline(&mut self, attempt: AttemptId) {
        self.deadlines
            .insert(attempt, Instant::now() + self.config.handshake_timeout);
    }

    async fn local_stream(&mut self) -> LocalStream {
        if let Some(stream) = &self.local_stream {
            return stream.clone();
        }

        let stream = match self.media.capture().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Local capture failed, continuing without media: {}", e);
                self.emit(ClientEvent::CaptureFailed(e.to_string()));
                LocalStream::data_only()
            }
        };

        self.local_stream = Some(stream.clone());
        stream
    }

    fn adapter_mut(&mut self, attempt: AttemptId) -> Option<&mut PeerConnectionAdapter> {
        match self.offerer.as_mut() {
            Some(offerer) if offerer.attempt() == attempt => Some(offerer),
            _ => self.answerers.get_mut(&attempt),
        }
    }

    async fn send_for(&mut self, attempt: AttemptId, msg: ClientMessage, notice: ClientEvent) {
        match self.channel.send(msg).await {
            Ok(()) => self.emit(notice),
            Err(e) => self.fail_attempt(attempt, e.to_string()).await,
        }
    }

    /// Mark `attempt` failed, close it and forget it. Other attempts are
    /// untouched.
    async fn fail_attempt(&mut self, attempt: AttemptId, reason: String) {
        self.deadlines.remove(&attempt);
        let is_offerer = self.offerer.as_ref().map(PeerConnectionAdapter::attempt) == Some(attempt);
        let adapter = if is_offerer {
            self.offerer.take()
        } else {
            self.answerers.remove(&attempt)
        };

        let Some(mut adapter) = adapter else {
            debug!("Failure of discarded attempt {}: {}", attempt, reason);
            return;
        };

        adapter.fail(reason);
        adapter.close().await;

        let reason = adapter.failure().unwrap_or_default().to_owned();
        self.emit(ClientEvent::AttemptFailed { attempt, reason });
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status == status {
            return;
        }

        info!("Signalling status: {:?}", status);
        self.status = status;
        self.emit(ClientEvent::StatusChanged(status));
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }
}
