use lobby_core::ParticipantId;
use std::collections::HashMap;

/// Remote ICE candidates that arrived before the remote description was set
/// for their link. Drained in arrival order once it is.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: HashMap<ParticipantId, Vec<String>>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, peer_id: ParticipantId, candidate: String) {
        self.pending.entry(peer_id).or_default().push(candidate);
    }

    pub fn drain(&mut self, peer_id: &ParticipantId) -> Vec<String> {
        self.pending.remove(peer_id).unwrap_or_default()
    }

    /// Drops whatever is queued for a peer. Returns how many were dropped.
    pub fn discard(&mut self, peer_id: &ParticipantId) -> usize {
        self.pending.remove(peer_id).map_or(0, |c| c.len())
    }

    pub fn len(&self, peer_id: &ParticipantId) -> usize {
        self.pending.get(peer_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.values().all(Vec::is_empty)
    }
}
