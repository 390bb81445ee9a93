mod memory_bus;
mod pubsub;
mod ws_bus;

pub use memory_bus::*;
pub use pubsub::*;
pub use ws_bus::*;
