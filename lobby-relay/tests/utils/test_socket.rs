use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A raw WebSocket client on one relay topic.
pub struct TestSocket {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestSocket {
    pub async fn open(addr: SocketAddr, topic: &str) -> Self {
        let (inner, _) = connect_async(format!("ws://{addr}/topics/{topic}"))
            .await
            .unwrap();
        Self { inner }
    }

    pub async fn send(&mut self, text: impl Into<String>) {
        self.inner
            .send(Message::Text(text.into().into()))
            .await
            .unwrap();
    }

    /// Next text frame, skipping control frames.
    pub async fn next_text(&mut self) -> String {
        loop {
            let frame = timeout(Duration::from_secs(2), self.inner.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .unwrap();
            if let Message::Text(text) = frame {
                return text.as_str().to_owned();
            }
        }
    }

    pub async fn close(mut self) {
        self.inner.close(None).await.unwrap();
    }
}
