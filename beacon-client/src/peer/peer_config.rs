/// ICE configuration for peer connections.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    pub ice_servers: Vec<String>,
}

impl PeerConfig {
    /// Host candidates only. Enough for peers on the same machine or LAN.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
        }
    }
}
