use async_trait::async_trait;
use lobby_core::{Envelope, Topic};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::Result;

/// Room-scoped publish/subscribe provider.
///
/// Contract: a published envelope is delivered, best effort, to every live
/// subscription of the topic *including the publisher's own*. Envelopes from
/// one publisher reach one subscriber in publish order. Nothing is replayed to
/// late subscribers.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Fire and forget.
    async fn publish(&self, topic: &Topic, envelope: Envelope) -> Result<()>;

    /// Starts receiving everything published on `topic` from now on.
    async fn subscribe(&self, topic: &Topic) -> Result<Subscription>;
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    topic: Topic,
    rx: mpsc::UnboundedReceiver<Envelope>,
    tasks: Vec<JoinHandle<()>>,
    on_drop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    pub fn new(topic: Topic, rx: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self {
            topic,
            rx,
            tasks: Vec::new(),
            on_drop: None,
        }
    }

    /// Ties a background task to the lifetime of the subscription.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn on_drop(mut self, f: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Box::new(f));
        self
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Next envelope, or `None` once the underlying transport is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(f) = self.on_drop.take() {
            f();
        }
    }
}
