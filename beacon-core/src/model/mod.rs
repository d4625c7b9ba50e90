mod blob;
mod connection;
mod directory;
mod peer;
mod signaling;

pub use blob::SignalBlob;
pub use connection::ConnectionId;
pub use directory::{DirectoryEntry, DirectorySnapshot};
pub use peer::PeerId;
pub use signaling::{ClientMessage, ServerMessage, SignalEnvelope};
