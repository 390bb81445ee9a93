use lobby_core::ParticipantId;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Identifies one concrete connection to a peer. A peer that is torn down and
/// reconnected gets a new generation, so late callbacks from the old
/// connection can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkTag {
    pub peer_id: ParticipantId,
    pub generation: u64,
}

/// Transport-level connectivity reported by a media connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

pub enum PeerEventKind {
    /// Trickle ICE: a local candidate, already serialized to JSON.
    CandidateGenerated(String),
    StateChanged(TransportState),
    RemoteTrack(Arc<TrackRemote>),
}

/// Emitted by media connections into the session loop.
pub struct PeerEvent {
    pub tag: LinkTag,
    pub kind: PeerEventKind,
}

impl PeerEvent {
    pub fn new(tag: LinkTag, kind: PeerEventKind) -> Self {
        Self { tag, kind }
    }
}

impl fmt::Debug for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            PeerEventKind::CandidateGenerated(_) => "candidate",
            PeerEventKind::StateChanged(_) => "state",
            PeerEventKind::RemoteTrack(_) => "track",
        };
        f.debug_struct("PeerEvent")
            .field("tag", &self.tag)
            .field("kind", &kind)
            .finish()
    }
}
