use lobby_core::{ChatMessage, Envelope, ParticipantId, RoomId, Topic};
use std::sync::Arc;
use tracing::{debug, info};

use crate::transport::{PubSub, Subscription};
use crate::{Result, VoiceError};

/// Room text chat over the room's broadcast topic.
///
/// Sent messages are not added locally: the provider echoes them back, so
/// every message, own ones included, enters the timeline exactly once, on
/// receipt.
pub struct RoomChatChannel {
    local_id: ParticipantId,
    author: String,
    topic: Topic,
    bus: Arc<dyn PubSub>,
    subscription: Option<Subscription>,
}

impl RoomChatChannel {
    pub fn new(
        bus: Arc<dyn PubSub>,
        room: &RoomId,
        local_id: ParticipantId,
        author: impl Into<String>,
    ) -> Self {
        Self {
            local_id,
            author: author.into(),
            topic: room.chat_topic(),
            bus,
            subscription: None,
        }
    }

    /// Creates the channel and subscribes right away.
    pub async fn open(
        bus: Arc<dyn PubSub>,
        room: &RoomId,
        local_id: ParticipantId,
        author: impl Into<String>,
    ) -> Result<Self> {
        let mut channel = Self::new(bus, room, local_id, author);
        channel.connect().await?;
        Ok(channel)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// (Re)subscribes. Messages published while disconnected are not recovered.
    pub async fn connect(&mut self) -> Result<()> {
        self.subscription = Some(self.bus.subscribe(&self.topic).await?);
        info!("Chat connected on {}", self.topic);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.subscription.take().is_some() {
            debug!("Chat on {} closed", self.topic);
        }
    }

    /// Publishes `text`. Empty or whitespace-only text is not sent.
    pub async fn send(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if !self.is_connected() {
            return Err(VoiceError::TransportDisconnected(self.topic.clone()));
        }
        let message = ChatMessage::new(self.author.clone(), text);
        self.bus
            .publish(&self.topic, Envelope::chat(self.local_id.clone(), message))
            .await
    }

    /// Waits for the next chat message.
    ///
    /// Returns `None` once when the subscription is lost; the channel is then
    /// disconnected and waits forever until [`connect`](Self::connect) is
    /// called again.
    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return std::future::pending().await;
            };
            match subscription.recv().await {
                Some(Envelope::Chat { payload, .. }) => return Some(payload),
                Some(other) => debug!("Ignoring {} on chat topic", other.kind()),
                None => {
                    self.subscription = None;
                    return None;
                }
            }
        }
    }
}
