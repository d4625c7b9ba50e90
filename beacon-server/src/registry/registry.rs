use crate::registry::peer_session::{PeerSession, SessionState};
use beacon_core::{ConnectionId, DirectorySnapshot, PeerId, SignalBlob};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// In-memory session table.
///
/// Owned by the rendezvous event loop and never shared, so it carries no
/// locking of its own. Every mutation happens through `&mut self`.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<ConnectionId, PeerSession>,
    next_seq: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the blank session for a freshly opened channel. Returns `false`
    /// if one already exists.
    pub fn open(&mut self, connection: ConnectionId) -> bool {
        match self.sessions.entry(connection) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(PeerSession::new(connection));
                true
            }
        }
    }

    /// Create or overwrite the registration of `connection`. The offer is not
    /// inspected. Alias and offer are replaced together.
    pub fn upsert_offer(
        &mut self,
        connection: ConnectionId,
        id: PeerId,
        alias: String,
        offer: SignalBlob,
    ) -> SessionState {
        self.next_seq += 1;
        let seq = self.next_seq;

        let session = self
            .sessions
            .entry(connection)
            .or_insert_with(|| PeerSession::new(connection));

        if session.offer.is_none() || session.id.as_ref() != Some(&id) {
            session.advertised_since = seq;
        }
        session.registered_at = seq;
        session.id = Some(id);
        session.alias = alias;
        session.offer = Some(offer);

        session.state()
    }

    /// Drop the session of `connection`. Unknown connections are a no-op.
    pub fn remove(&mut self, connection: &ConnectionId) -> Option<PeerSession> {
        self.sessions.remove(connection)
    }

    /// Forget every session. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.sessions.len();
        self.sessions.clear();
        dropped
    }

    /// The channel currently advertising `id`.
    ///
    /// Ids are client-asserted, so two channels may claim the same one; the
    /// most recent registration owns it.
    pub fn owner_of(&self, id: &PeerId) -> Option<ConnectionId> {
        self.sessions
            .values()
            .filter(|session| session.advertised_id() == Some(id))
            .max_by_key(|session| session.registered_at)
            .map(|session| session.connection)
    }

    /// Every advertising session, ordered by first advertisement.
    ///
    /// Sessions claiming the same id are all listed; answers to that id are
    /// routed by [`Registry::owner_of`].
    pub fn snapshot(&self) -> DirectorySnapshot {
        let mut advertising: Vec<&PeerSession> = self
            .sessions
            .values()
            .filter(|session| session.advertised_id().is_some())
            .collect();
        advertising.sort_by_key(|session| session.advertised_since);

        advertising
            .into_iter()
            .filter_map(PeerSession::directory_entry)
            .collect()
    }

    pub fn get(&self, connection: &ConnectionId) -> Option<&PeerSession> {
        self.sessions.get(connection)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
