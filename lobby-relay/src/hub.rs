use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

const TOPIC_CAPACITY: usize = 256;
const MAX_TOPIC_LEN: usize = 128;

/// Live topics and their sockets. Text frames are fanned out unchanged.
#[derive(Clone, Default)]
pub struct TopicHub {
    topics: Arc<DashMap<String, broadcast::Sender<String>>>,
}

impl TopicHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1 to 128 characters of `[A-Za-z0-9_:.-]`.
    pub fn is_valid_topic(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_TOPIC_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-'))
    }

    /// Registers one more socket on `topic`, creating the topic if needed.
    pub fn join(&self, topic: &str) -> broadcast::Receiver<String> {
        self.topics
            .entry(topic.to_owned())
            .or_insert_with(|| {
                debug!("Topic {} opened", topic);
                broadcast::channel(TOPIC_CAPACITY).0
            })
            .subscribe()
    }

    /// Sends `text` to every socket on `topic`, the sender's included.
    /// Returns how many sockets it reached.
    pub fn publish(&self, topic: &str, text: String) -> usize {
        let Some(tx) = self.topics.get(topic).map(|tx| tx.clone()) else {
            return 0;
        };
        tx.send(text).unwrap_or(0)
    }

    /// Drops `topic` once its last socket is gone. Call after the socket's
    /// receiver has been dropped.
    pub fn leave(&self, topic: &str) {
        if self
            .topics
            .remove_if(topic, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            debug!("Topic {} closed", topic);
        }
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}
