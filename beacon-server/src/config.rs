use crate::rendezvous::DEFAULT_COALESCE_LIMIT;
use std::net::SocketAddr;

/// Host configuration of the rendezvous server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listening address for HTTP and WebSocket traffic.
    pub addr: SocketAddr,
    /// Capacity of the command queue in front of the rendezvous loop.
    pub command_capacity: usize,
    /// See [`crate::RendezvousServer::with_coalesce_limit`].
    pub coalesce_limit: usize,
}

impl ServerConfig {
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            command_capacity: 100,
            coalesce_limit: DEFAULT_COALESCE_LIMIT,
        }
    }
}
