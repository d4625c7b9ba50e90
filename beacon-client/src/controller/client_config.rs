use std::time::Duration;

/// Tunables of a [`crate::ClientController`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// How long an attempt may negotiate before it is failed. An offerer
    /// waiting in its room for an answer never expires.
    pub handshake_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
        }
    }
}
