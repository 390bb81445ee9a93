use lobby_core::{ChatMessage, ParticipantId};
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Which subscription a transport notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Signaling,
    Chat,
    Membership,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Signaling => "signaling",
            Self::Chat => "chat",
            Self::Membership => "membership",
        };
        f.write_str(name)
    }
}

/// State changes surfaced to the host application.
pub enum SessionNotice {
    /// Voice is off for this session. Chat and membership keep working.
    MediaUnavailable(String),
    PeerJoined(ParticipantId),
    PeerApproved(ParticipantId),
    PeerLeft(ParticipantId),
    PeerConnected(ParticipantId),
    /// A handshake timed out or the media path failed.
    PeerUnreachable(ParticipantId),
    RemoteTrack {
        peer_id: ParticipantId,
        track: Arc<TrackRemote>,
    },
    Chat(ChatMessage),
    TransportDisconnected(ChannelKind),
    TransportRestored(ChannelKind),
    /// The local participant was removed from the room by someone else.
    Kicked,
    /// The session loop has stopped. Always the last notice.
    Closed,
}

impl fmt::Debug for SessionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaUnavailable(reason) => f.debug_tuple("MediaUnavailable").field(reason).finish(),
            Self::PeerJoined(id) => f.debug_tuple("PeerJoined").field(id).finish(),
            Self::PeerApproved(id) => f.debug_tuple("PeerApproved").field(id).finish(),
            Self::PeerLeft(id) => f.debug_tuple("PeerLeft").field(id).finish(),
            Self::PeerConnected(id) => f.debug_tuple("PeerConnected").field(id).finish(),
            Self::PeerUnreachable(id) => f.debug_tuple("PeerUnreachable").field(id).finish(),
            Self::RemoteTrack { peer_id, .. } => {
                f.debug_struct("RemoteTrack").field("peer_id", peer_id).finish()
            }
            Self::Chat(msg) => f.debug_tuple("Chat").field(msg).finish(),
            Self::TransportDisconnected(kind) => {
                f.debug_tuple("TransportDisconnected").field(kind).finish()
            }
            Self::TransportRestored(kind) => f.debug_tuple("TransportRestored").field(kind).finish(),
            Self::Kicked => f.write_str("Kicked"),
            Self::Closed => f.write_str("Closed"),
        }
    }
}
