use lobby_core::{Participant, RoomId};
use std::sync::Arc;

use crate::Result;
use crate::VoiceConfig;
use crate::media::MediaSource;
use crate::membership::RosterSource;
use crate::peer::{PeerConnector, RtcPeerConnector};
use crate::transport::PubSub;

/// Who joins which room, with what settings.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub room: RoomId,
    pub participant: Participant,
    pub config: VoiceConfig,
}

impl SessionParams {
    pub fn new(room: RoomId, participant: Participant) -> Self {
        Self {
            room,
            participant,
            config: VoiceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: VoiceConfig) -> Self {
        self.config = config;
        self
    }
}

/// External collaborators of a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub bus: Arc<dyn PubSub>,
    pub roster: Arc<dyn RosterSource>,
    pub media: Arc<dyn MediaSource>,
    pub connector: Arc<dyn PeerConnector>,
}

impl SessionDeps {
    /// Uses real WebRTC connections configured from `config`.
    pub fn webrtc(
        bus: Arc<dyn PubSub>,
        roster: Arc<dyn RosterSource>,
        media: Arc<dyn MediaSource>,
        config: &VoiceConfig,
    ) -> Result<Self> {
        Ok(Self {
            bus,
            roster,
            media,
            connector: Arc::new(RtcPeerConnector::new(&config.ice_servers)?),
        })
    }
}
