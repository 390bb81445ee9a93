use lobby_voice::SessionNotice;
use lobby_voice::media::NoAudioDevice;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{join_room, join_room_with, test_config};

#[tokio::test]
async fn test_session_without_microphone_keeps_chat() {
    init_tracing();
    let (bus, roster, room) = create_test_room();

    let mut a = join_room_with(
        &bus,
        &roster,
        &room,
        "A",
        test_config(),
        Arc::new(NoAudioDevice),
    )
    .await;
    let b = join_room(&bus, &roster, &room, "B").await;

    assert!(
        a.wait_for_notice(|n| matches!(n, SessionNotice::MediaUnavailable(_)), 1000)
            .await
            .is_some()
    );

    a.handle.send_chat("no mic here").await.unwrap();
    assert_eq!(b.wait_for_timeline(1, 5000).await, vec!["no mic here"]);
    assert_eq!(a.wait_for_timeline(1, 5000).await, vec!["no mic here"]);

    // Muting without a stream is harmless.
    a.handle.mute(true).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(a.links().await.is_empty());
    assert!(a.connector.connections().await.is_empty());
    assert!(b.links().await.is_empty());
}
