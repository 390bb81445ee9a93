use lobby_core::{ParticipantId, Topic};
use thiserror::Error;

pub type Result<T, E = VoiceError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// The local capture stream could not be acquired. Voice is disabled for
    /// the session, chat and membership keep running.
    #[error("local audio unavailable: {0}")]
    MediaUnavailable(String),

    /// A handshake message arrived for a link that is not in a state to take it.
    #[error("stale {signal} from {peer} while link is {state}")]
    StaleSignal {
        peer: ParticipantId,
        signal: String,
        state: String,
    },

    #[error("subscription to {0} is not active")]
    TransportDisconnected(Topic),

    #[error("handshake with {0} timed out")]
    HandshakeTimeout(ParticipantId),

    #[error("handshake with {peer} failed")]
    Handshake {
        peer: ParticipantId,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid session parameters: {0}")]
    InvalidParams(String),

    #[error("session has ended")]
    SessionClosed,

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
}

impl VoiceError {
    pub(crate) fn handshake(peer: &ParticipantId, source: anyhow::Error) -> Self {
        Self::Handshake {
            peer: peer.clone(),
            source,
        }
    }

    pub(crate) fn stale(
        peer: &ParticipantId,
        signal: impl ToString,
        state: impl ToString,
    ) -> Self {
        Self::StaleSignal {
            peer: peer.clone(),
            signal: signal.to_string(),
            state: state.to_string(),
        }
    }

    /// Errors that are expected under normal message races.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleSignal { .. })
    }
}
