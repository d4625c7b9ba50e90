mod signalling_channel;
mod ws_channel;

pub use signalling_channel::*;
pub use ws_channel::*;
