mod app;
mod config;
mod registry;
mod rendezvous;
mod signaling;

pub use app::*;
pub use config::*;
pub use registry::*;
pub use rendezvous::*;
pub use signaling::*;
