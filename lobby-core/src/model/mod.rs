mod chat;
mod envelope;
mod ice;
mod participant;
mod room;
mod roster;

pub use chat::ChatMessage;
pub use envelope::{CandidatePayload, Envelope, EnvelopeKind, SessionPayload};
pub use ice::{DEFAULT_STUN_SERVERS, IceServerConfig};
pub use participant::{Participant, ParticipantId};
pub use room::{RoomId, Topic};
pub use roster::{MembershipEvent, MembershipStatus, RosterRow};
