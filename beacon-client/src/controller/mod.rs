mod client_command;
mod client_config;
mod client_controller;
mod client_event;
mod local_identity;

pub use client_command::*;
pub use client_config::*;
pub use client_controller::*;
pub use client_event::*;
pub use local_identity::*;
