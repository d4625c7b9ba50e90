use beacon_core::PeerId;

/// User intents fed to a running controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Advertise a fresh offer, discarding the previous one.
    CreateRoom,
    /// Answer the offer `PeerId` advertises in the current directory.
    ConnectTo(PeerId),
    /// Local only until the next `CreateRoom`.
    SetAlias(String),
    ClearRooms,
    Shutdown,
}
