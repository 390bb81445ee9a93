mod consumer;
mod memory_roster;
mod roster_source;

pub use consumer::*;
pub use memory_roster::*;
pub use roster_source::*;
