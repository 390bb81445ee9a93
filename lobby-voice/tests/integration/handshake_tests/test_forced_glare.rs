use lobby_core::ParticipantId;
use lobby_voice::peer::{HandshakeState, Role};

use crate::integration::init_tracing;
use crate::utils::{ManagerFixture, MockConnector, MockConnectorConfig};

/// Both managers originate before seeing the other's offer. The smaller id
/// keeps its offer, the larger one rolls back and answers.
#[tokio::test]
async fn test_crossed_offers_resolve_to_one_link() {
    init_tracing();
    let mut a = ManagerFixture::new("A").await;
    let mut b = ManagerFixture::new("B").await;
    let a_id = ParticipantId::from("A");
    let b_id = ParticipantId::from("B");

    a.manager.originate(&b_id).await.unwrap();
    b.manager.originate(&a_id).await.unwrap();

    let offer_from_b = b.signaling.offers_to("A").await.remove(0);
    let offer_from_a = a.signaling.offers_to("B").await.remove(0);

    let err = a
        .manager
        .accept_offer(&b_id, offer_from_b)
        .await
        .unwrap_err();
    assert!(err.is_stale());
    assert_eq!(a.state_of("B"), Some(HandshakeState::AwaitingAnswer));

    b.manager.accept_offer(&a_id, offer_from_a).await.unwrap();
    assert_eq!(b.state_of("A"), Some(HandshakeState::Connected));
    assert_eq!(b.manager.links()[0].role, Role::Answerer);

    let b_connections = b.connector.connections_to("A").await;
    assert_eq!(b_connections.len(), 2);
    assert!(b_connections[0].is_closed().await);

    let answer = b.signaling.answer_for("A").await.unwrap();
    a.manager.accept_answer(&b_id, answer).await.unwrap();

    assert_eq!(a.manager.links().len(), 1);
    assert_eq!(a.manager.links()[0].role, Role::Offerer);
    assert_eq!(a.state_of("B"), Some(HandshakeState::Connected));
    assert_eq!(a.connector.connections().await.len(), 1);
}

/// Candidates B gathered for its refused offer never reach A's surviving
/// connection, whether they arrive before or after A refuses that offer.
#[tokio::test]
async fn test_refused_offer_candidates_are_dropped() {
    init_tracing();
    let mut a = ManagerFixture::new("A").await;
    let mut b = ManagerFixture::with_connector(
        "B",
        MockConnector::with_config(
            "B",
            MockConnectorConfig {
                candidates: 2,
                report_connected: false,
            },
        ),
    )
    .await;
    let a_id = ParticipantId::from("A");
    let b_id = ParticipantId::from("B");

    a.manager.originate(&b_id).await.unwrap();
    b.manager.originate(&a_id).await.unwrap();
    b.pump().await;

    let offer_from_a = a.signaling.offers_to("B").await.remove(0);
    let offer_from_b = b.signaling.offers_to("A").await.remove(0);
    let refused = b.signaling.candidates_for("A").await;
    assert_eq!(refused, vec!["cand B->A #1.0", "cand B->A #1.1"]);
    b.signaling.take().await;

    a.manager
        .add_remote_candidate(&b_id, refused[0].clone())
        .await
        .unwrap();
    let err = a
        .manager
        .accept_offer(&b_id, offer_from_b)
        .await
        .unwrap_err();
    assert!(err.is_stale());
    a.manager
        .add_remote_candidate(&b_id, refused[1].clone())
        .await
        .unwrap();

    b.manager.accept_offer(&a_id, offer_from_a).await.unwrap();
    b.pump().await;
    let answer = b.signaling.answer_for("A").await.unwrap();
    let fresh = b.signaling.candidates_for("A").await;

    a.manager.accept_answer(&b_id, answer).await.unwrap();
    for candidate in fresh {
        a.manager.add_remote_candidate(&b_id, candidate).await.unwrap();
    }

    assert_eq!(a.state_of("B"), Some(HandshakeState::Connected));
    let conn = a.connector.latest_to("B").await.unwrap();
    assert_eq!(
        conn.applied_candidates().await,
        vec!["cand B->A #2.0", "cand B->A #2.1"]
    );
}
