use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use lobby_core::{Envelope, Topic};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::transport::{PubSub, Subscription};
use crate::{Result, VoiceError};

/// Pub/sub client for a `lobby-relay` server.
///
/// Each subscribed topic holds one WebSocket (`{base_url}/topics/{topic}`);
/// publishing goes out through that socket, so a topic must be subscribed
/// before anything can be published on it.
#[derive(Clone)]
pub struct WsBus {
    base_url: String,
    writers: Arc<DashMap<Topic, mpsc::UnboundedSender<String>>>,
}

impl WsBus {
    /// `base_url` like `ws://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            writers: Arc::new(DashMap::new()),
        }
    }

    fn topic_url(&self, topic: &Topic) -> String {
        format!("{}/topics/{}", self.base_url.trim_end_matches('/'), topic)
    }
}

#[async_trait]
impl PubSub for WsBus {
    async fn publish(&self, topic: &Topic, envelope: Envelope) -> Result<()> {
        let json = envelope.to_json()?;
        let writer = self
            .writers
            .get(topic)
            .map(|w| w.clone())
            .ok_or_else(|| VoiceError::TransportDisconnected(topic.clone()))?;

        writer
            .send(json)
            .map_err(|_| VoiceError::TransportDisconnected(topic.clone()))
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        let url = self.topic_url(topic);
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| VoiceError::Transport(format!("connect {url}: {e}")))?;
        info!("Subscribed to {} via {}", topic, url);

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        if let Some(previous) = self.writers.insert(topic.clone(), out_tx.clone()) {
            debug!("Replacing previous writer for {}", topic);
            drop(previous);
        }

        let send_task = tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let recv_topic = topic.clone();
        let recv_writers = self.writers.clone();
        let recv_writer = out_tx.clone();
        let recv_task = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match Envelope::from_json(text.as_str()) {
                        Ok(envelope) => {
                            if in_tx.send(envelope).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid envelope on {}: {}", recv_topic, e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay connection for {} failed: {}", recv_topic, e);
                        break;
                    }
                }
            }
            recv_writers.remove_if(&recv_topic, |_, w| w.same_channel(&recv_writer));
            info!("Relay stream for {} ended", recv_topic);
        });

        let writers = self.writers.clone();
        let drop_topic = topic.clone();
        Ok(Subscription::new(topic.clone(), in_rx)
            .with_task(send_task)
            .with_task(recv_task)
            .on_drop(move || {
                writers.remove_if(&drop_topic, |_, w| w.same_channel(&out_tx));
            }))
    }
}
