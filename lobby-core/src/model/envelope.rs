use crate::model::chat::ChatMessage;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub sdp: String,
}

/// Candidate init serialized as JSON (`candidate`, `sdpMid`, `sdpMLineIndex`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePayload {
    pub candidate: String,
}

/// The unit carried by the signaling and chat topics.
///
/// Wire shape: `{ "type", "sender", "target"?, "payload"? }`. Offers, answers
/// and candidates always name a target; announces may (a directed reply) or
/// may not (broadcast); chat never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Envelope {
    PeerAnnounce {
        sender: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ParticipantId>,
    },
    Offer {
        sender: ParticipantId,
        target: ParticipantId,
        payload: SessionPayload,
    },
    Answer {
        sender: ParticipantId,
        target: ParticipantId,
        payload: SessionPayload,
    },
    IceCandidate {
        sender: ParticipantId,
        target: ParticipantId,
        payload: CandidatePayload,
    },
    Chat {
        sender: ParticipantId,
        payload: ChatMessage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    PeerAnnounce,
    Offer,
    Answer,
    IceCandidate,
    Chat,
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PeerAnnounce => "peer-announce",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::Chat => "chat",
        };
        f.write_str(name)
    }
}

impl Envelope {
    pub fn announce(sender: ParticipantId) -> Self {
        Self::PeerAnnounce {
            sender,
            target: None,
        }
    }

    pub fn announce_to(sender: ParticipantId, target: ParticipantId) -> Self {
        Self::PeerAnnounce {
            sender,
            target: Some(target),
        }
    }

    pub fn offer(sender: ParticipantId, target: ParticipantId, sdp: String) -> Self {
        Self::Offer {
            sender,
            target,
            payload: SessionPayload { sdp },
        }
    }

    pub fn answer(sender: ParticipantId, target: ParticipantId, sdp: String) -> Self {
        Self::Answer {
            sender,
            target,
            payload: SessionPayload { sdp },
        }
    }

    pub fn ice_candidate(sender: ParticipantId, target: ParticipantId, candidate: String) -> Self {
        Self::IceCandidate {
            sender,
            target,
            payload: CandidatePayload { candidate },
        }
    }

    pub fn chat(sender: ParticipantId, message: ChatMessage) -> Self {
        Self::Chat {
            sender,
            payload: message,
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::PeerAnnounce { .. } => EnvelopeKind::PeerAnnounce,
            Self::Offer { .. } => EnvelopeKind::Offer,
            Self::Answer { .. } => EnvelopeKind::Answer,
            Self::IceCandidate { .. } => EnvelopeKind::IceCandidate,
            Self::Chat { .. } => EnvelopeKind::Chat,
        }
    }

    pub fn sender(&self) -> &ParticipantId {
        match self {
            Self::PeerAnnounce { sender, .. }
            | Self::Offer { sender, .. }
            | Self::Answer { sender, .. }
            | Self::IceCandidate { sender, .. }
            | Self::Chat { sender, .. } => sender,
        }
    }

    /// `None` means broadcast.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            Self::PeerAnnounce { target, .. } => target.as_ref(),
            Self::Offer { target, .. }
            | Self::Answer { target, .. }
            | Self::IceCandidate { target, .. } => Some(target),
            Self::Chat { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
