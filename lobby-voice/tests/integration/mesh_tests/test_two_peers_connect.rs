use lobby_core::ParticipantId;
use lobby_voice::SessionNotice;
use lobby_voice::peer::{HandshakeState, Role};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::join_room;

#[tokio::test]
async fn test_two_peers_connect() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let mut host = join_room(&bus, &roster, &room, "A").await;
    let guest = join_room(&bus, &roster, &room, "B").await;

    assert!(host.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(guest.wait_for_links(1, HandshakeState::Connected, 5000).await);

    let host_links = host.links().await;
    assert_eq!(host_links[0].peer_id, ParticipantId::from("B"));
    assert_eq!(host_links[0].role, Role::Offerer);

    let guest_links = guest.links().await;
    assert_eq!(guest_links[0].peer_id, ParticipantId::from("A"));
    assert_eq!(guest_links[0].role, Role::Answerer);

    assert_eq!(host.connector.connections_to("B").await.len(), 1);
    assert_eq!(guest.connector.connections_to("A").await.len(), 1);

    let connected = host
        .wait_for_notice(
            |n| matches!(n, SessionNotice::PeerConnected(id) if *id == ParticipantId::from("B")),
            5000,
        )
        .await;
    assert!(connected.is_some(), "Host should report the media path to B");
}

#[tokio::test]
async fn test_guest_with_smaller_id_originates() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let host = join_room(&bus, &roster, &room, "M").await;
    let guest = join_room(&bus, &roster, &room, "C").await;

    assert!(host.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(guest.wait_for_links(1, HandshakeState::Connected, 5000).await);

    assert_eq!(guest.links().await[0].role, Role::Offerer);
    assert_eq!(host.links().await[0].role, Role::Answerer);
}

#[tokio::test]
async fn test_candidates_reach_the_other_side() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let a = join_room(&bus, &roster, &room, "A").await;
    let b = join_room(&bus, &roster, &room, "B").await;
    assert!(a.wait_for_links(1, HandshakeState::Connected, 5000).await);
    assert!(b.wait_for_links(1, HandshakeState::Connected, 5000).await);

    // Both sides emit two candidates per local description.
    let mut applied = Vec::new();
    for _ in 0..200 {
        applied = b
            .connector
            .latest_to("A")
            .await
            .expect("B has no connection to A")
            .applied_candidates()
            .await;
        if applied.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(applied.contains(&"cand A->B #1.0".to_string()));
    assert!(applied.contains(&"cand A->B #1.1".to_string()));
}
