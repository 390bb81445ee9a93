use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::media::LocalStream;
use crate::peer::{LinkTag, PeerEvent};

/// One negotiated media connection to a remote participant.
///
/// Implementations report candidates, connectivity and remote tracks through
/// the event channel handed to [`PeerConnector::connect`].
#[async_trait]
pub trait MediaConnection: Send + Sync {
    /// Creates an offer, installs it as the local description and returns its SDP.
    async fn create_offer(&self) -> anyhow::Result<String>;

    async fn set_remote_offer(&self, sdp: String) -> anyhow::Result<()>;

    /// Creates an answer, installs it as the local description and returns its SDP.
    async fn create_answer(&self) -> anyhow::Result<String>;

    async fn set_remote_answer(&self, sdp: String) -> anyhow::Result<()>;

    /// `candidate` is the JSON form produced by the remote side.
    async fn add_ice_candidate(&self, candidate: String) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Factory for media connections with the local audio track attached.
///
/// Connection callbacks must never wait on the session loop: `close()` waits
/// for the callbacks it triggers, and the loop is the one calling it.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        tag: LinkTag,
        local: &LocalStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> anyhow::Result<Box<dyn MediaConnection>>;
}
