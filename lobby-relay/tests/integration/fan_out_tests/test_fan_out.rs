use crate::integration::init_tracing;
use crate::utils::{TestSocket, spawn_relay, wait_subscribers};

#[tokio::test]
async fn test_fan_out_includes_sender() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;

    let mut a = TestSocket::open(addr, "room_R1").await;
    let mut b = TestSocket::open(addr, "room_R1").await;
    let mut other = TestSocket::open(addr, "room_R2").await;
    wait_subscribers(&hub, "room_R1", 2).await;
    wait_subscribers(&hub, "room_R2", 1).await;

    a.send("hello from a").await;
    assert_eq!(a.next_text().await, "hello from a");
    assert_eq!(b.next_text().await, "hello from a");

    other.send("elsewhere").await;
    assert_eq!(other.next_text().await, "elsewhere");

    // room_R2 traffic never reaches room_R1
    b.send("from b").await;
    assert_eq!(a.next_text().await, "from b");
    assert_eq!(b.next_text().await, "from b");
}

#[tokio::test]
async fn test_fan_out_keeps_sender_order() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;

    let mut a = TestSocket::open(addr, "voice_signaling_R1").await;
    let mut b = TestSocket::open(addr, "voice_signaling_R1").await;
    wait_subscribers(&hub, "voice_signaling_R1", 2).await;

    for i in 0..20 {
        a.send(format!("frame {i}")).await;
    }
    for i in 0..20 {
        assert_eq!(b.next_text().await, format!("frame {i}"));
    }
}
