mod rendezvous_server;
mod server_command;

pub use rendezvous_server::*;
pub use server_command::*;
