use async_trait::async_trait;
use lobby_core::{Envelope, ParticipantId, RoomId, Topic};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::Result;
use crate::signaling::SignalingOutput;
use crate::transport::{PubSub, Subscription};

/// The room's voice signaling topic, bound to the local participant.
///
/// The provider echoes every publish back to the publisher; [`accepts`]
/// is the receive-side filter that drops that echo along with traffic
/// addressed to somebody else.
///
/// [`accepts`]: SignalingChannel::accepts
#[derive(Clone)]
pub struct SignalingChannel {
    local_id: ParticipantId,
    topic: Topic,
    bus: Arc<dyn PubSub>,
}

impl SignalingChannel {
    pub fn new(bus: Arc<dyn PubSub>, room: &RoomId, local_id: ParticipantId) -> Self {
        Self {
            local_id,
            topic: room.signaling_topic(),
            bus,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        self.bus.subscribe(&self.topic).await
    }

    pub async fn publish(&self, envelope: Envelope) {
        let kind = envelope.kind();
        if let Err(e) = self.bus.publish(&self.topic, envelope).await {
            warn!("Failed to publish {} on {}: {}", kind, self.topic, e);
        }
    }

    /// Whether an inbound envelope is meant for the local participant.
    pub fn accepts(&self, envelope: &Envelope) -> bool {
        if matches!(envelope, Envelope::Chat { .. }) {
            return false;
        }
        if envelope.sender() == &self.local_id {
            return false;
        }
        match envelope.target() {
            Some(target) if target != &self.local_id => {
                debug!(
                    "Ignoring {} from {} addressed to {}",
                    envelope.kind(),
                    envelope.sender(),
                    target
                );
                false
            }
            _ => true,
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    async fn send_announce(&self, target: Option<ParticipantId>) {
        let msg = match target {
            Some(target) => Envelope::announce_to(self.local_id.clone(), target),
            None => Envelope::announce(self.local_id.clone()),
        };
        self.publish(msg).await;
    }

    async fn send_offer(&self, target: ParticipantId, sdp: String) {
        self.publish(Envelope::offer(self.local_id.clone(), target, sdp))
            .await;
    }

    async fn send_answer(&self, target: ParticipantId, sdp: String) {
        self.publish(Envelope::answer(self.local_id.clone(), target, sdp))
            .await;
    }

    async fn send_ice(&self, target: ParticipantId, candidate: String) {
        self.publish(Envelope::ice_candidate(
            self.local_id.clone(),
            target,
            candidate,
        ))
        .await;
    }
}
