use lobby_voice::peer::{LinkTag, PeerConnector, RtcPeerConnector};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::integration::init_tracing;
use crate::utils::local_stream;

/// Nobody reads the event channel while the connections gather candidates
/// and shut down; closing must still return promptly.
#[tokio::test]
async fn test_close_with_undrained_events() {
    init_tracing();
    let connector = RtcPeerConnector::new(&[]).expect("Failed to build connector");
    let (tx_a, _rx_a) = mpsc::unbounded_channel();
    let (tx_b, _rx_b) = mpsc::unbounded_channel();
    let stream = local_stream().await;

    let conn_a = connector
        .connect(
            LinkTag {
                peer_id: "B".into(),
                generation: 1,
            },
            &stream,
            tx_a,
        )
        .await
        .expect("Failed to connect A");
    let conn_b = connector
        .connect(
            LinkTag {
                peer_id: "A".into(),
                generation: 1,
            },
            &stream,
            tx_b,
        )
        .await
        .expect("Failed to connect B");

    let offer = conn_a.create_offer().await.expect("Offer failed");
    conn_b.set_remote_offer(offer).await.expect("Remote offer failed");
    let answer = conn_b.create_answer().await.expect("Answer failed");
    conn_a
        .set_remote_answer(answer)
        .await
        .expect("Remote answer failed");

    // Let gathering pile events up in both channels.
    sleep(Duration::from_millis(500)).await;

    timeout(Duration::from_secs(5), conn_a.close())
        .await
        .expect("Close A hung")
        .expect("Close A failed");
    timeout(Duration::from_secs(5), conn_b.close())
        .await
        .expect("Close B hung")
        .expect("Close B failed");
}
