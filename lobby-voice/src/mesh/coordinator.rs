use lobby_core::{Envelope, ParticipantId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::VoiceError;
use crate::peer::{PeerConnectionManager, Role};

/// Decides which links should exist and who originates them.
///
/// Every pair of participants gets exactly one link. The lexicographically
/// smaller id always sends the offer; the larger one answers a broadcast
/// announce with a directed announce so the smaller one learns about it,
/// and otherwise waits. Roster joins and announces may arrive in any order;
/// both end in the same idempotent `originate`.
pub struct MeshCoordinator {
    local_id: ParticipantId,
    known: HashSet<ParticipantId>,
    retries: HashMap<ParticipantId, u8>,
    max_retries: u8,
}

impl MeshCoordinator {
    pub fn new(local_id: ParticipantId, max_retries: u8) -> Self {
        Self {
            local_id,
            known: HashSet::new(),
            retries: HashMap::new(),
            max_retries,
        }
    }

    pub fn is_known(&self, peer_id: &ParticipantId) -> bool {
        self.known.contains(peer_id)
    }

    pub fn known_peers(&self) -> Vec<ParticipantId> {
        let mut peers: Vec<_> = self.known.iter().cloned().collect();
        peers.sort();
        peers
    }

    /// A participant showed up in the roster or membership feed.
    pub async fn peer_joined(&mut self, peers: &mut PeerConnectionManager, peer_id: &ParticipantId) {
        if *peer_id == self.local_id {
            return;
        }
        if self.known.insert(peer_id.clone()) {
            info!("{} is in the room", peer_id);
        }
        self.connect(peers, peer_id).await;
    }

    /// A participant announced itself on the signaling topic.
    pub async fn peer_announced(
        &mut self,
        peers: &mut PeerConnectionManager,
        sender: &ParticipantId,
        directed: bool,
    ) {
        if *sender == self.local_id {
            return;
        }
        self.known.insert(sender.clone());

        match Role::designated(&self.local_id, sender) {
            // A broadcast announce means the sender just subscribed and may
            // have missed an offer made off a roster event.
            Role::Offerer if !directed && peers.resend_offer(sender).await => {}
            Role::Offerer => self.connect(peers, sender).await,
            Role::Answerer if !directed => {
                debug!("Replying to announce from {}", sender);
                peers.announce(Some(sender.clone())).await;
            }
            Role::Answerer => {}
        }
    }

    /// A participant left or was removed. Only its own link is touched.
    pub async fn peer_left(&mut self, peers: &mut PeerConnectionManager, peer_id: &ParticipantId) {
        self.known.remove(peer_id);
        self.retries.remove(peer_id);
        if peers.teardown(peer_id).await {
            info!("{} left, link removed", peer_id);
        }
    }

    /// Routes an accepted signaling envelope.
    pub async fn handle_signal(&mut self, peers: &mut PeerConnectionManager, envelope: Envelope) {
        let result = match envelope {
            Envelope::PeerAnnounce { sender, target } => {
                self.peer_announced(peers, &sender, target.is_some()).await;
                Ok(())
            }
            Envelope::Offer {
                sender, payload, ..
            } => {
                self.known.insert(sender.clone());
                peers.accept_offer(&sender, payload.sdp).await
            }
            Envelope::Answer {
                sender, payload, ..
            } => peers.accept_answer(&sender, payload.sdp).await,
            Envelope::IceCandidate {
                sender, payload, ..
            } => peers.add_remote_candidate(&sender, payload.candidate).await,
            Envelope::Chat { .. } => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_stale() => debug!("{}", e),
            Err(e) => warn!("Signal handling failed: {:?}", e),
        }
    }

    /// The media path to `peer_id` is up; its retry budget starts over.
    pub fn peer_connected(&mut self, peer_id: &ParticipantId) {
        self.retries.remove(peer_id);
    }

    /// Called after a link was torn down without completing. Re-originates
    /// while the retry budget lasts, when this side is the offerer and the
    /// peer is still around. Returns whether a new attempt was made.
    pub async fn link_failed(
        &mut self,
        peers: &mut PeerConnectionManager,
        peer_id: &ParticipantId,
        role: Role,
    ) -> bool {
        if role != Role::Offerer || !self.known.contains(peer_id) {
            return false;
        }
        let attempts = self.retries.entry(peer_id.clone()).or_insert(0);
        if *attempts >= self.max_retries {
            warn!("Giving up on {} after {} retries", peer_id, attempts);
            return false;
        }
        *attempts += 1;
        info!("Retrying link to {} (attempt {})", peer_id, attempts);
        self.connect(peers, peer_id).await;
        peers.has_link(peer_id)
    }

    /// Runs the handshake timeout. Returns the peers whose handshake timed out.
    pub async fn sweep(
        &mut self,
        peers: &mut PeerConnectionManager,
        timeout: Duration,
    ) -> Vec<ParticipantId> {
        let expired = peers.expire_stalled(timeout).await;
        let mut unreachable = Vec::with_capacity(expired.len());
        for link in expired {
            warn!("{}", VoiceError::HandshakeTimeout(link.peer_id.clone()));
            self.link_failed(peers, &link.peer_id, link.role).await;
            unreachable.push(link.peer_id);
        }
        unreachable
    }

    async fn connect(&mut self, peers: &mut PeerConnectionManager, peer_id: &ParticipantId) {
        if Role::designated(&self.local_id, peer_id) != Role::Offerer {
            debug!("Waiting for {} to originate", peer_id);
            return;
        }
        match peers.originate(peer_id).await {
            Ok(_) => {}
            Err(VoiceError::MediaUnavailable(_)) => {
                debug!("Voice disabled, not linking to {}", peer_id)
            }
            Err(e) => warn!("Could not originate link to {}: {:?}", peer_id, e),
        }
    }
}
