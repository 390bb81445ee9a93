use async_trait::async_trait;
use dashmap::DashMap;
use lobby_core::{Envelope, Topic};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::Result;
use crate::transport::{PubSub, Subscription};

const TOPIC_CAPACITY: usize = 1024;

/// In-process pub/sub. Every topic is a broadcast channel, so the publisher's
/// own subscription receives its envelopes too.
#[derive(Clone, Default)]
pub struct MemoryBus {
    topics: Arc<DashMap<Topic, broadcast::Sender<Envelope>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the topic as if the provider lost it: every current subscription
    /// of `topic` ends. Later subscriptions start a fresh topic.
    pub fn disconnect(&self, topic: &Topic) {
        if self.topics.remove(topic).is_some() {
            debug!("MemoryBus dropped topic {}", topic);
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<Envelope> {
        self.topics
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl PubSub for MemoryBus {
    async fn publish(&self, topic: &Topic, envelope: Envelope) -> Result<()> {
        let Some(tx) = self.topics.get(topic).map(|tx| tx.clone()) else {
            debug!("No subscribers on {}, dropping {}", topic, envelope.kind());
            return Ok(());
        };
        // No receivers is not an error for a best effort bus.
        let _ = tx.send(envelope);
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        let mut source = self.sender(topic).subscribe();
        let (tx, rx) = mpsc::unbounded_channel();

        let topic_name = topic.clone();
        let forward = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(envelope) => {
                        if tx.send(envelope).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber on {} lagged, {} envelopes lost", topic_name, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(topic.clone(), rx).with_task(forward))
    }
}
