use lobby_relay::{TopicHub, router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serves a fresh hub on `127.0.0.1:0`.
pub async fn spawn_relay() -> (SocketAddr, TopicHub) {
    let hub = TopicHub::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(hub.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hub)
}

/// Polls `check` every 10ms until it holds or `ms` elapse.
pub async fn eventually(ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub async fn wait_subscribers(hub: &TopicHub, topic: &str, count: usize) {
    assert!(
        eventually(2000, || hub.subscriber_count(topic) == count).await,
        "expected {count} subscribers on {topic}, got {}",
        hub.subscriber_count(topic)
    );
}
