use beacon_core::PeerId;

/// Who this client claims to be. The id is generated once and stays stable
/// across every room it creates; the alias is a free display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub id: PeerId,
    pub alias: String,
}

impl LocalIdentity {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(),
            alias: alias.into(),
        }
    }

    pub fn with_id(id: PeerId, alias: impl Into<String>) -> Self {
        Self {
            id,
            alias: alias.into(),
        }
    }
}
