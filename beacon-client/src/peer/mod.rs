mod adapter;
mod capability;
mod media;
mod peer_config;
mod webrtc_capability;

pub use adapter::*;
pub use capability::*;
pub use media::*;
pub use peer_config::*;
pub use webrtc_capability::*;
