mod channel;
mod controller;
mod peer;

pub use channel::*;
pub use controller::*;
pub use peer::*;
