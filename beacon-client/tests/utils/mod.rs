
pub use fake_capability::*;
pub use memory_channel::*;
pub use test_client::*;
