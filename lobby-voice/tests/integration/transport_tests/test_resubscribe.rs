use lobby_voice::SessionNotice;
use lobby_voice::peer::HandshakeState;
use lobby_voice::session::ChannelKind;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::join_room;

fn disconnected(kind: ChannelKind) -> impl Fn(&SessionNotice) -> bool {
    move |n| matches!(n, SessionNotice::TransportDisconnected(k) if *k == kind)
}

fn restored(kind: ChannelKind) -> impl Fn(&SessionNotice) -> bool {
    move |n| matches!(n, SessionNotice::TransportRestored(k) if *k == kind)
}

#[tokio::test]
async fn test_signaling_loss_keeps_links_and_resubscribes() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let mut a = join_room(&bus, &roster, &room, "A").await;
    let b = join_room(&bus, &roster, &room, "B").await;
    assert!(a.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(b.wait_for_links(1, HandshakeState::Connected, 5000).await);

    bus.disconnect(&room.signaling_topic());

    assert!(a.wait_for_notice(disconnected(ChannelKind::Signaling), 5000).await.is_some());
    assert!(a.wait_for_notice(restored(ChannelKind::Signaling), 5000).await.is_some());

    // Re-announcing does not disturb established links.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(a.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(b.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert_eq!(a.connector.connections().await.len(), 1);
    assert_eq!(b.connector.connections().await.len(), 1);
}

#[tokio::test]
async fn test_chat_resumes_after_resubscribe() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let mut a = join_room(&bus, &roster, &room, "A").await;
    let mut b = join_room(&bus, &roster, &room, "B").await;

    bus.disconnect(&room.chat_topic());
    assert!(a.wait_for_notice(disconnected(ChannelKind::Chat), 5000).await.is_some());
    assert!(a.wait_for_notice(restored(ChannelKind::Chat), 5000).await.is_some());
    assert!(b.wait_for_notice(restored(ChannelKind::Chat), 5000).await.is_some());

    a.handle.send_chat("still here").await.unwrap();
    assert_eq!(b.wait_for_timeline(1, 5000).await, vec!["still here"]);
}

#[tokio::test]
async fn test_membership_feed_is_restored() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let mut a = join_room(&bus, &roster, &room, "A").await;

    roster.disconnect(&room);
    assert!(a.wait_for_notice(disconnected(ChannelKind::Membership), 5000).await.is_some());
    assert!(a.wait_for_notice(restored(ChannelKind::Membership), 5000).await.is_some());

    let b = join_room(&bus, &roster, &room, "B").await;
    assert!(a.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(b.wait_for_links(1, HandshakeState::Connected, 5000).await);
}
