use crate::integration::init_tracing;
use crate::utils::{TestSocket, spawn_relay, wait_subscribers};

#[tokio::test]
async fn test_oversized_frame_dropped() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;

    let mut a = TestSocket::open(addr, "room_big").await;
    let mut b = TestSocket::open(addr, "room_big").await;
    wait_subscribers(&hub, "room_big", 2).await;

    a.send("x".repeat(64 * 1024 + 1)).await;
    a.send("small").await;

    assert_eq!(b.next_text().await, "small");
    assert_eq!(a.next_text().await, "small");
}
