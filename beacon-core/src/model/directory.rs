use crate::model::blob::SignalBlob;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: PeerId,
    pub alias: String,
    pub offer: SignalBlob,
}

/// Full set of advertising peers. Always sent whole, never as a diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectorySnapshot(pub Vec<DirectoryEntry>);

impl DirectorySnapshot {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Most recently advertised entry for `id`.
    pub fn get(&self, id: &PeerId) -> Option<&DirectoryEntry> {
        self.0.iter().rev().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectoryEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for DirectorySnapshot {
    type Item = DirectoryEntry;
    type IntoIter = std::vec::IntoIter<DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<DirectoryEntry> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = DirectoryEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
