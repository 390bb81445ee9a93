use lobby_core::{ChatMessage, Envelope, ParticipantId, RoomId};
use lobby_voice::VoiceError;
use lobby_voice::transport::{PubSub, WsBus};
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::{eventually, spawn_relay, wait_subscribers};

#[tokio::test]
async fn test_ws_bus_round_trip() {
    init_tracing();
    let (addr, hub) = spawn_relay().await;
    let topic = RoomId::random().chat_topic();

    let alice = WsBus::new(format!("ws://{addr}"));
    let bob = WsBus::new(format!("ws://{addr}/"));
    let mut alice_sub = alice.subscribe(&topic).await.unwrap();
    let mut bob_sub = bob.subscribe(&topic).await.unwrap();
    wait_subscribers(&hub, topic.as_str(), 2).await;

    let envelope = Envelope::chat(ParticipantId::from("A"), ChatMessage::new("Alice", "gg"));
    alice.publish(&topic, envelope.clone()).await.unwrap();

    let to_bob = timeout(Duration::from_secs(2), bob_sub.recv()).await.unwrap();
    let to_alice = timeout(Duration::from_secs(2), alice_sub.recv())
        .await
        .unwrap();
    assert_eq!(to_bob, Some(envelope.clone()));
    assert_eq!(to_alice, Some(envelope));

    drop(alice_sub);
    drop(bob_sub);
    assert!(eventually(2000, || hub.topic_count() == 0).await);

    let err = alice
        .publish(&topic, Envelope::announce(ParticipantId::from("A")))
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::TransportDisconnected(_)));
}

#[tokio::test]
async fn test_relay_unreachable() {
    init_tracing();
    let bus = WsBus::new("ws://127.0.0.1:9");
    let err = bus
        .subscribe(&RoomId::random().chat_topic())
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::Transport(_)));
}
