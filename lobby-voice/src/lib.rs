//! Peer-to-peer voice mesh and room chat for lobby rooms.
//!
//! A [`VoiceSession`] owns everything for one participant in one room: the
//! signaling and chat subscriptions, the peer connection registry and the
//! membership feed. Host applications drive it through a [`SessionHandle`]
//! and observe it through [`SessionNotice`]s.

mod config;
mod error;

pub mod chat;
pub mod ice;
pub mod media;
pub mod membership;
pub mod mesh;
pub mod peer;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::VoiceConfig;
pub use error::{Result, VoiceError};
pub use session::{SessionDeps, SessionHandle, SessionNotice, SessionParams, VoiceSession};
