use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::integration::init_tracing;
use crate::utils::{TestSocket, spawn_relay, wait_subscribers};

#[tokio::test]
async fn test_invalid_topic_rejected() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;

    let too_long = "x".repeat(129);
    for topic in ["bad%20topic", "bad!topic", too_long.as_str()] {
        match connect_async(format!("ws://{addr}/topics/{topic}")).await {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{topic}")
            }
            Err(e) => panic!("unexpected error for {topic}: {e}"),
            Ok(_) => panic!("{topic} should have been rejected"),
        }
    }
    assert_eq!(hub.topic_count(), 0);
}

#[tokio::test]
async fn test_topic_charset_accepted() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;

    let topic = "room:lobby.eu-1_R7";
    let mut socket = TestSocket::open(addr, topic).await;
    wait_subscribers(&hub, topic, 1).await;

    socket.send("ping").await;
    assert_eq!(socket.next_text().await, "ping");
}
