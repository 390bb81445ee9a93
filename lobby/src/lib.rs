pub use lobby_core::model::{ParticipantId, RoomId};
pub use lobby_voice::{
    Result, SessionDeps, SessionHandle, SessionNotice, SessionParams, VoiceConfig, VoiceError,
    VoiceSession,
};

pub mod model {
    pub use lobby_core::model::*;
}

pub mod voice {
    pub use lobby_voice::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use lobby_relay::*;
}
