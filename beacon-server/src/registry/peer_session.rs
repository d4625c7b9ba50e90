use beacon_core::{ConnectionId, DirectoryEntry, PeerId, SignalBlob};

/// Where a session is in its lifecycle. `Closed` is not represented: a closed
/// session no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Advertising,
}

/// One open channel's registration.
#[derive(Debug, Clone)]
pub struct PeerSession {
    pub connection: ConnectionId,
    pub id: Option<PeerId>,
    pub alias: String,
    pub offer: Option<SignalBlob>,
    /// Sequence number of the first registration, used to order the directory.
    pub(crate) advertised_since: u64,
    /// Sequence number of the latest registration.
    pub(crate) registered_at: u64,
}

impl PeerSession {
    pub(crate) fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            id: None,
            alias: String::new(),
            offer: None,
            advertised_since: 0,
            registered_at: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.offer.is_some() {
            SessionState::Advertising
        } else {
            SessionState::Connected
        }
    }

    /// The id this session is discoverable under, if it advertises an offer.
    pub fn advertised_id(&self) -> Option<&PeerId> {
        self.offer.as_ref().and(self.id.as_ref())
    }

    pub fn directory_entry(&self) -> Option<DirectoryEntry> {
        let id = self.id.clone()?;
        let offer = self.offer.clone()?;
        Some(DirectoryEntry {
            id,
            alias: self.alias.clone(),
            offer,
        })
    }
}
