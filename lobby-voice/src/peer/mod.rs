mod connection;
mod handshake;
mod manager;
mod peer_event;
mod peer_link;
mod rtc_connection;

pub use connection::*;
pub use handshake::*;
pub use manager::*;
pub use peer_event::*;
pub use peer_link::*;
pub use rtc_connection::*;
