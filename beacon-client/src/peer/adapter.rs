use crate::peer::capability::{AttemptId, CapabilityError, PeerCapability, RemoteStream};
use beacon_core::{ClientMessage, DirectoryEntry, PeerId, SignalBlob, SignalEnvelope};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Capability is producing the local description.
    Negotiating,
    /// Offer registered, waiting for someone to answer it.
    AwaitingAnswer,
    /// Both descriptions exchanged.
    Answered,
    /// A remote stream is usable.
    Connected,
    /// Terminal. No retry; a new attempt needs a new adapter.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterRole {
    Offerer,
    Answerer { remote: PeerId },
}

/// Drives one connection attempt through its handshake.
///
/// Never talks to the signalling channel itself: outbound messages are
/// returned to the owner, who decides whether to send them.
pub struct PeerConnectionAdapter {
    attempt: AttemptId,
    role: AdapterRole,
    state: AdapterState,
    capability: Box<dyn PeerCapability>,
    failure: Option<String>,
}

impl PeerConnectionAdapter {
    /// Wrap an initiator capability that is already generating its offer.
    pub fn offerer(attempt: AttemptId, capability: Box<dyn PeerCapability>) -> Self {
        Self {
            attempt,
            role: AdapterRole::Offerer,
            state: AdapterState::Negotiating,
            capability,
            failure: None,
        }
    }

    /// Answer the offer advertised in `entry`. The offer is fed to the
    /// capability right away; the adapter comes back `Failed` if it is refused.
    pub async fn answerer(
        attempt: AttemptId,
        entry: &DirectoryEntry,
        capability: Box<dyn PeerCapability>,
    ) -> Self {
        let mut adapter = Self {
            attempt,
            role: AdapterRole::Answerer {
                remote: entry.id.clone(),
            },
            state: AdapterState::Negotiating,
            capability,
            failure: None,
        };

        if let Err(e) = adapter.capability.signal(entry.offer.clone()).await {
            adapter.fail(e.to_string());
        }
        adapter
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn role(&self) -> &AdapterRole {
        &self.role
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// The peer being answered, if this is an answerer.
    pub fn remote(&self) -> Option<&PeerId> {
        match &self.role {
            AdapterRole::Offerer => None,
            AdapterRole::Answerer { remote } => Some(remote),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == AdapterState::Failed
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The local offer is ready. Returns the `register` to send, carrying the
    /// identity as it is right now.
    pub fn on_local_offer(
        &mut self,
        id: &PeerId,
        alias: &str,
        offer: SignalBlob,
    ) -> Option<ClientMessage> {
        if self.role != AdapterRole::Offerer || self.state != AdapterState::Negotiating {
            warn!(
                "Attempt {} ignoring local offer in state {:?}",
                self.attempt, self.state
            );
            return None;
        }

        self.state = AdapterState::AwaitingAnswer;
        info!("Attempt {} registering offer as {} ({:?})", self.attempt, id, alias);

        Some(ClientMessage::Register {
            id: id.clone(),
            alias: alias.to_owned(),
            offer,
        })
    }

    /// The local answer is ready. Returns the `signalling` message routed to
    /// the peer whose offer was answered.
    pub fn on_local_answer(&mut self, answer: SignalBlob) -> Option<ClientMessage> {
        let AdapterRole::Answerer { remote } = &self.role else {
            warn!("Offerer attempt {} produced an answer", self.attempt);
            return None;
        };
        if self.state != AdapterState::Negotiating {
            warn!(
                "Attempt {} ignoring local answer in state {:?}",
                self.attempt, self.state
            );
            return None;
        }

        self.state = AdapterState::Answered;
        info!("Attempt {} answering {}", self.attempt, remote);

        Some(ClientMessage::Signal(SignalEnvelope {
            target_id: remote.clone(),
            answer,
        }))
    }

    /// An answer to our registered offer arrived. Only the first one is used.
    pub async fn on_remote_answer(&mut self, answer: SignalBlob) -> Result<(), CapabilityError> {
        if self.role != AdapterRole::Offerer || self.state != AdapterState::AwaitingAnswer {
            debug!(
                "Attempt {} ignoring remote answer in state {:?}",
                self.attempt, self.state
            );
            return Ok(());
        }

        match self.capability.signal(answer).await {
            Ok(()) => {
                self.state = AdapterState::Answered;
                Ok(())
            }
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Returns `false` when the stream belongs to a failed attempt.
    pub fn on_stream_ready(&mut self, stream: &RemoteStream) -> bool {
        if self.is_failed() {
            return false;
        }

        info!("Attempt {} connected ({})", self.attempt, stream.label());
        self.state = AdapterState::Connected;
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_failed() {
            return;
        }

        let reason = reason.into();
        warn!("Attempt {} failed: {}", self.attempt, reason);
        self.state = AdapterState::Failed;
        self.failure = Some(reason);
    }

    pub async fn close(&self) {
        self.capability.close().await;
    }
}
