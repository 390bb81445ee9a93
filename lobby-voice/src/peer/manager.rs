use lobby_core::ParticipantId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use webrtc::track::track_remote::TrackRemote;

use crate::ice::CandidateQueue;
use crate::media::LocalStream;
use crate::peer::{
    HandshakeState, LinkEvent, LinkSnapshot, LinkTag, PeerConnector, PeerEvent, PeerEventKind,
    PeerLink, Role, TransportState,
};
use crate::signaling::SignalingOutput;
use crate::{Result, VoiceError};

/// What a media-connection event meant for the session.
pub enum PeerOutcome {
    Connected(ParticipantId),
    /// The transport failed or closed and the link was torn down.
    Lost { peer_id: ParticipantId, role: Role },
    RemoteTrack(ParticipantId, Arc<TrackRemote>),
}

/// A link torn down by the handshake timeout sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredLink {
    pub peer_id: ParticipantId,
    pub role: Role,
    pub state: HandshakeState,
}

/// Registry of peer links for one session: at most one link per remote
/// participant, driven through the offer/answer handshake.
///
/// Owned by the session loop and only ever touched from it, so every
/// operation runs to completion before the next signal is looked at.
pub struct PeerConnectionManager {
    local_id: ParticipantId,
    connector: Arc<dyn PeerConnector>,
    signaling: Arc<dyn SignalingOutput>,
    local_stream: Option<LocalStream>,
    links: HashMap<ParticipantId, PeerLink>,
    candidates: CandidateQueue,
    events_tx: mpsc::UnboundedSender<PeerEvent>,
    next_generation: u64,
}

impl PeerConnectionManager {
    pub fn new(
        local_id: ParticipantId,
        connector: Arc<dyn PeerConnector>,
        signaling: Arc<dyn SignalingOutput>,
        local_stream: Option<LocalStream>,
        events_tx: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self {
        Self {
            local_id,
            connector,
            signaling,
            local_stream,
            links: HashMap::new(),
            candidates: CandidateQueue::new(),
            events_tx,
            next_generation: 0,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    pub fn voice_enabled(&self) -> bool {
        self.local_stream.is_some()
    }

    pub fn has_link(&self, peer_id: &ParticipantId) -> bool {
        self.links
            .get(peer_id)
            .is_some_and(|l| l.state() != HandshakeState::Closed)
    }

    pub fn link_state(&self, peer_id: &ParticipantId) -> Option<HandshakeState> {
        self.links.get(peer_id).map(PeerLink::state)
    }

    /// Snapshot of every link, ordered by peer id.
    pub fn links(&self) -> Vec<LinkSnapshot> {
        let mut links: Vec<_> = self.links.values().map(PeerLink::snapshot).collect();
        links.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        links
    }

    pub async fn announce(&self, target: Option<ParticipantId>) {
        self.signaling.send_announce(target).await;
    }

    /// Creates a link to `peer_id` and sends it an offer.
    ///
    /// Returns `Ok(false)` without doing anything when a live link already
    /// exists, so repeated calls for one peer never produce a second link.
    pub async fn originate(&mut self, peer_id: &ParticipantId) -> Result<bool> {
        if *peer_id == self.local_id {
            return Ok(false);
        }
        if let Some(link) = self.links.get(peer_id) {
            debug!(
                "Link to {} already {}, not originating again",
                peer_id,
                link.state()
            );
            return Ok(false);
        }

        let mut link = self.open_link(peer_id, Role::Offerer).await?;
        link.apply(LinkEvent::Originate)?;
        self.links.insert(peer_id.clone(), link);

        if let Err(e) = self.send_offer(peer_id).await {
            self.teardown(peer_id).await;
            return Err(e);
        }
        info!("Sent offer to {}", peer_id);
        Ok(true)
    }

    /// Publishes the pending offer to `peer_id` again, followed by every
    /// candidate gathered so far. For peers that subscribed after the offer
    /// went out; a peer that did get it drops the copy as a duplicate.
    pub async fn resend_offer(&mut self, peer_id: &ParticipantId) -> bool {
        let Some(link) = self.links.get(peer_id) else {
            return false;
        };
        if link.state() != HandshakeState::AwaitingAnswer {
            return false;
        }
        let Some(sdp) = link.local_sdp() else {
            return false;
        };
        debug!("Resending offer to {}", peer_id);
        self.signaling.send_offer(peer_id.clone(), sdp.to_owned()).await;
        for candidate in link.local_candidates() {
            self.signaling
                .send_ice(peer_id.clone(), candidate.clone())
                .await;
        }
        true
    }

    /// Handles a remote offer: answers it, resolves glare, or treats it as a
    /// restart of the remote session.
    pub async fn accept_offer(&mut self, sender: &ParticipantId, sdp: String) -> Result<()> {
        if let Some(link) = self.links.get_mut(sender) {
            let state = link.state();
            let duplicate = link.remote_sdp() == Some(sdp.as_str());
            match state {
                HandshakeState::Offering | HandshakeState::AwaitingAnswer => {
                    if Role::designated(&self.local_id, sender) == Role::Offerer {
                        // Candidates already queued came from the refused offer.
                        link.refuse_offer();
                        let dropped = self.candidates.discard(sender);
                        if dropped > 0 {
                            debug!("Discarded {} candidates of {}'s refused offer", dropped, sender);
                        }
                        return Err(VoiceError::stale(sender, LinkEvent::OfferReceived, state));
                    }
                    info!("Offer collision with {}, yielding to the remote offer", sender);
                }
                HandshakeState::Answering | HandshakeState::Connected if duplicate => {
                    return Err(VoiceError::stale(sender, "duplicate offer", state));
                }
                HandshakeState::Connected => {
                    info!("{} sent a new offer, renegotiating from scratch", sender);
                }
                HandshakeState::Answering => {
                    return Err(VoiceError::stale(sender, LinkEvent::OfferReceived, state));
                }
                HandshakeState::Idle | HandshakeState::Closed => {}
            }
            self.teardown(sender).await;
        }

        let mut link = self.open_link(sender, Role::Answerer).await?;
        link.apply(LinkEvent::OfferReceived)?;
        self.links.insert(sender.clone(), link);

        if let Err(e) = self.answer(sender, sdp).await {
            self.teardown(sender).await;
            return Err(e);
        }
        info!("Answered offer from {}", sender);
        Ok(())
    }

    /// Applies a remote answer to a link waiting for one. Anything else is
    /// reported as stale and leaves the link untouched.
    pub async fn accept_answer(&mut self, sender: &ParticipantId, sdp: String) -> Result<()> {
        let Some(link) = self.links.get_mut(sender) else {
            return Err(VoiceError::stale(sender, LinkEvent::AnswerReceived, "absent"));
        };
        if link.state() != HandshakeState::AwaitingAnswer {
            return Err(VoiceError::stale(
                sender,
                LinkEvent::AnswerReceived,
                link.state(),
            ));
        }

        link.connection()
            .set_remote_answer(sdp.clone())
            .await
            .map_err(|e| VoiceError::handshake(sender, e))?;
        link.set_remote_sdp(sdp);
        link.apply(LinkEvent::AnswerReceived)?;

        let queued = self.candidates.drain(sender);
        apply_candidates(link, queued).await;
        info!("Handshake with {} complete", sender);
        Ok(())
    }

    /// Applies a remote candidate now, or queues it until the link has a
    /// remote description. Candidates for peers without a link are dropped.
    pub async fn add_remote_candidate(
        &mut self,
        sender: &ParticipantId,
        candidate: String,
    ) -> Result<()> {
        let Some(link) = self.links.get(sender) else {
            debug!("Ignoring candidate from {}: no link", sender);
            return Ok(());
        };

        if link.drops_early_candidates() {
            debug!("Ignoring candidate from {}: belongs to a refused offer", sender);
            Ok(())
        } else if link.has_remote_description() {
            link.connection()
                .add_ice_candidate(candidate)
                .await
                .map_err(|e| VoiceError::handshake(sender, e))
        } else {
            self.candidates.enqueue(sender.clone(), candidate);
            debug!(
                "Queued candidate from {} ({} pending)",
                sender,
                self.candidates.len(sender)
            );
            Ok(())
        }
    }

    /// Folds an event from a media connection into the registry. Events from
    /// links that were already replaced or torn down are dropped.
    pub async fn handle_event(&mut self, event: PeerEvent) -> Option<PeerOutcome> {
        let PeerEvent { tag, kind } = event;
        let Some(link) = self.links.get(&tag.peer_id) else {
            debug!("Dropping event for {}: no link", tag.peer_id);
            return None;
        };
        if link.generation() != tag.generation {
            debug!("Dropping event from retired link to {}", tag.peer_id);
            return None;
        }
        let role = link.role();
        let peer_id = tag.peer_id;

        match kind {
            PeerEventKind::CandidateGenerated(candidate) => {
                if let Some(link) = self.links.get_mut(&peer_id) {
                    link.record_local_candidate(candidate.clone());
                }
                self.signaling.send_ice(peer_id, candidate).await;
                None
            }
            PeerEventKind::StateChanged(TransportState::Connected) => {
                info!("Media path to {} is up", peer_id);
                Some(PeerOutcome::Connected(peer_id))
            }
            PeerEventKind::StateChanged(TransportState::Disconnected) => {
                warn!("Media path to {} interrupted", peer_id);
                None
            }
            PeerEventKind::StateChanged(state @ (TransportState::Failed | TransportState::Closed)) => {
                warn!("Media path to {} {:?}, tearing down", peer_id, state);
                self.teardown(&peer_id).await;
                Some(PeerOutcome::Lost { peer_id, role })
            }
            PeerEventKind::StateChanged(TransportState::Connecting) => None,
            PeerEventKind::RemoteTrack(track) => Some(PeerOutcome::RemoteTrack(peer_id, track)),
        }
    }

    /// Mutes or unmutes the local track on every link. No renegotiation.
    pub fn mute(&self, muted: bool) {
        if let Some(stream) = &self.local_stream {
            stream.set_muted(muted);
        }
    }

    /// Closes and forgets the link to `peer_id`. Returns whether one existed.
    pub async fn teardown(&mut self, peer_id: &ParticipantId) -> bool {
        let dropped = self.candidates.discard(peer_id);
        let Some(mut link) = self.links.remove(peer_id) else {
            return false;
        };
        if dropped > 0 {
            debug!("Discarded {} queued candidates for {}", dropped, peer_id);
        }
        let _ = link.apply(LinkEvent::Close);
        if let Err(e) = link.connection().close().await {
            warn!("Error closing connection to {}: {:?}", peer_id, e);
        }
        info!("Link to {} closed", peer_id);
        true
    }

    pub async fn teardown_all(&mut self) {
        let peers: Vec<_> = self.links.keys().cloned().collect();
        for peer_id in peers {
            self.teardown(&peer_id).await;
        }
    }

    /// Tears down every link still negotiating after `timeout`.
    pub async fn expire_stalled(&mut self, timeout: Duration) -> Vec<ExpiredLink> {
        let now = Instant::now();
        let stalled: Vec<_> = self
            .links
            .values()
            .filter(|l| l.state().is_pending() && now.duration_since(l.started_at()) >= timeout)
            .map(|l| ExpiredLink {
                peer_id: l.remote_id().clone(),
                role: l.role(),
                state: l.state(),
            })
            .collect();

        for expired in &stalled {
            warn!(
                "Handshake with {} stuck in {} for {:?}",
                expired.peer_id, expired.state, timeout
            );
            self.teardown(&expired.peer_id).await;
        }
        stalled
    }

    /// Stops the local capture. Called once the session is leaving.
    pub fn release_media(&mut self) {
        if let Some(stream) = self.local_stream.take() {
            stream.stop();
            debug!("Local audio released");
        }
    }

    async fn open_link(&mut self, peer_id: &ParticipantId, role: Role) -> Result<PeerLink> {
        let Some(stream) = &self.local_stream else {
            return Err(VoiceError::MediaUnavailable(
                "voice is disabled for this session".into(),
            ));
        };
        self.next_generation += 1;
        let tag = LinkTag {
            peer_id: peer_id.clone(),
            generation: self.next_generation,
        };
        let connection = self
            .connector
            .connect(tag, stream, self.events_tx.clone())
            .await
            .map_err(|e| VoiceError::handshake(peer_id, e))?;
        Ok(PeerLink::new(
            peer_id.clone(),
            self.next_generation,
            connection,
            role,
        ))
    }

    async fn send_offer(&mut self, peer_id: &ParticipantId) -> Result<()> {
        let link = self.link_mut(peer_id)?;
        let sdp = link
            .connection()
            .create_offer()
            .await
            .map_err(|e| VoiceError::handshake(peer_id, e))?;
        self.signaling.send_offer(peer_id.clone(), sdp.clone()).await;
        let link = self.link_mut(peer_id)?;
        link.set_local_sdp(sdp);
        link.apply(LinkEvent::OfferSent)?;
        Ok(())
    }

    async fn answer(&mut self, sender: &ParticipantId, sdp: String) -> Result<()> {
        let Some(link) = self.links.get_mut(sender) else {
            return Err(VoiceError::stale(sender, LinkEvent::OfferReceived, "absent"));
        };
        link.connection()
            .set_remote_offer(sdp.clone())
            .await
            .map_err(|e| VoiceError::handshake(sender, e))?;
        link.set_remote_sdp(sdp);

        let queued = self.candidates.drain(sender);
        apply_candidates(link, queued).await;

        let answer = link
            .connection()
            .create_answer()
            .await
            .map_err(|e| VoiceError::handshake(sender, e))?;
        self.signaling.send_answer(sender.clone(), answer.clone()).await;
        link.set_local_sdp(answer);
        link.apply(LinkEvent::AnswerSent)?;
        Ok(())
    }

    fn link_mut(&mut self, peer_id: &ParticipantId) -> Result<&mut PeerLink> {
        self.links
            .get_mut(peer_id)
            .ok_or_else(|| VoiceError::stale(peer_id, "local signal", "absent"))
    }
}

async fn apply_candidates(link: &PeerLink, candidates: Vec<String>) {
    if candidates.is_empty() {
        return;
    }
    debug!(
        "Applying {} queued candidates for {}",
        candidates.len(),
        link.remote_id()
    );
    for candidate in candidates {
        if let Err(e) = link.connection().add_ice_candidate(candidate).await {
            warn!("Queued candidate for {} rejected: {:?}", link.remote_id(), e);
        }
    }
}
