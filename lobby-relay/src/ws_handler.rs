use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::hub::TopicHub;

/// Largest text frame the relay forwards.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

pub async fn topic_ws_handler(
    ws: WebSocketUpgrade,
    Path(topic): Path<String>,
    State(hub): State<TopicHub>,
) -> Response {
    if !TopicHub::is_valid_topic(&topic) {
        warn!("Rejected subscription to invalid topic {:?}", topic);
        return (StatusCode::BAD_REQUEST, "invalid topic name").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, topic, hub))
}

async fn handle_socket(socket: WebSocket, topic: String, hub: TopicHub) {
    let mut rx = hub.join(&topic);
    info!(
        "Socket joined {} ({} subscribers)",
        topic,
        hub.subscriber_count(&topic)
    );

    let (mut sender, mut receiver) = socket.split();

    let mut recv_task = tokio::spawn({
        let hub = hub.clone();
        let topic = topic.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        if text.len() > MAX_FRAME_BYTES {
                            warn!(
                                "Dropping {} byte frame on {} (limit {})",
                                text.len(),
                                topic,
                                MAX_FRAME_BYTES
                            );
                            continue;
                        }
                        hub.publish(&topic, text.to_string());
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    let send_loop = async {
        loop {
            match rx.recv().await {
                Ok(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Socket on {} lagged, {} frames lost", topic, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        _ = send_loop => recv_task.abort(),
        _ = (&mut recv_task) => {},
    };

    drop(rx);
    hub.leave(&topic);
    info!("Socket left {}", topic);
}
