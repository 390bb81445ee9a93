use lobby_core::ParticipantId;
use std::fmt;

/// Negotiation phase of one peer link.
///
/// ```text
/// idle -> offering -> awaiting-answer -> connected -> closed
/// idle -> answering ------------------> connected -> closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    Idle,
    Offering,
    AwaitingAnswer,
    Answering,
    Connected,
    Closed,
}

/// Inputs of the handshake state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Originate,
    OfferSent,
    OfferReceived,
    AnswerSent,
    AnswerReceived,
    Close,
}

/// Which side of the pair sends the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Offerer,
    Answerer,
}

impl HandshakeState {
    /// The only place transitions are decided. `None` means the event is not
    /// legal in this state.
    pub fn on(self, event: LinkEvent) -> Option<HandshakeState> {
        use HandshakeState::*;
        use LinkEvent::*;

        match (self, event) {
            (Closed, _) => None,
            (_, Close) => Some(Closed),
            (Idle, Originate) => Some(Offering),
            (Offering, OfferSent) => Some(AwaitingAnswer),
            (AwaitingAnswer, AnswerReceived) => Some(Connected),
            (Idle, OfferReceived) => Some(Answering),
            (Answering, AnswerSent) => Some(Connected),
            _ => None,
        }
    }

    /// Still negotiating, subject to the handshake timeout.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Offering | Self::AwaitingAnswer | Self::Answering)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Offering => "offering",
            Self::AwaitingAnswer => "awaiting-answer",
            Self::Answering => "answering",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Originate => "originate",
            Self::OfferSent => "offer-sent",
            Self::OfferReceived => "offer",
            Self::AnswerSent => "answer-sent",
            Self::AnswerReceived => "answer",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

impl Role {
    /// Deterministic tie-break for a pair: the lexicographically smaller id
    /// always offers, the larger one always answers.
    pub fn designated(local: &ParticipantId, remote: &ParticipantId) -> Role {
        if local < remote {
            Role::Offerer
        } else {
            Role::Answerer
        }
    }
}
