use async_trait::async_trait;
use lobby_core::ParticipantId;

/// Outgoing half of the signaling channel as seen by the peer connection
/// manager. Sends are fire and forget: failures are logged by the
/// implementation, never reported back into the handshake.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Broadcast announce (`target == None`) or a directed announce reply.
    async fn send_announce(&self, target: Option<ParticipantId>);

    async fn send_offer(&self, target: ParticipantId, sdp: String);

    async fn send_answer(&self, target: ParticipantId, sdp: String);

    /// `candidate` is a JSON serialized candidate init.
    async fn send_ice(&self, target: ParticipantId, candidate: String);
}
