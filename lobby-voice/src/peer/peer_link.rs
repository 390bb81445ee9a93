use lobby_core::ParticipantId;
use tokio::time::Instant;
use tracing::debug;

use crate::peer::{HandshakeState, LinkEvent, MediaConnection, Role};
use crate::{Result, VoiceError};

/// State kept for one remote participant.
pub struct PeerLink {
    remote_id: ParticipantId,
    generation: u64,
    connection: Box<dyn MediaConnection>,
    state: HandshakeState,
    role: Role,
    remote_sdp: Option<String>,
    local_sdp: Option<String>,
    local_candidates: Vec<String>,
    /// A crossing offer from the remote was refused; its candidates are too.
    offer_refused: bool,
    started_at: Instant,
}

impl PeerLink {
    pub(crate) fn new(
        remote_id: ParticipantId,
        generation: u64,
        connection: Box<dyn MediaConnection>,
        role: Role,
    ) -> Self {
        Self {
            remote_id,
            generation,
            connection,
            state: HandshakeState::Idle,
            role,
            remote_sdp: None,
            local_sdp: None,
            local_candidates: Vec::new(),
            offer_refused: false,
            started_at: Instant::now(),
        }
    }

    /// Moves the link through the handshake state machine.
    pub(crate) fn apply(&mut self, event: LinkEvent) -> Result<HandshakeState> {
        let next = self
            .state
            .on(event)
            .ok_or_else(|| VoiceError::stale(&self.remote_id, event, self.state))?;
        debug!("Link {}: {} --{}--> {}", self.remote_id, self.state, event, next);
        self.state = next;
        Ok(next)
    }

    pub(crate) fn set_remote_sdp(&mut self, sdp: String) {
        self.remote_sdp = Some(sdp);
    }

    pub(crate) fn set_local_sdp(&mut self, sdp: String) {
        self.local_sdp = Some(sdp);
    }

    pub(crate) fn refuse_offer(&mut self) {
        self.offer_refused = true;
    }

    /// Whether remote candidates seen before the answer belong to a refused
    /// offer rather than to this link.
    pub(crate) fn drops_early_candidates(&self) -> bool {
        self.offer_refused && self.remote_sdp.is_none()
    }

    pub(crate) fn record_local_candidate(&mut self, candidate: String) {
        self.local_candidates.push(candidate);
    }

    /// The offer or answer this side sent.
    pub fn local_sdp(&self) -> Option<&str> {
        self.local_sdp.as_deref()
    }

    /// Candidates gathered locally and sent so far, in order.
    pub fn local_candidates(&self) -> &[String] {
        &self.local_candidates
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connection(&self) -> &dyn MediaConnection {
        self.connection.as_ref()
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_sdp.is_some()
    }

    pub fn remote_sdp(&self) -> Option<&str> {
        self.remote_sdp.as_deref()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            peer_id: self.remote_id.clone(),
            state: self.state,
            role: self.role,
        }
    }
}

/// Read-only view of a link, handed out to callers outside the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub peer_id: ParticipantId,
    pub state: HandshakeState,
    pub role: Role,
}
