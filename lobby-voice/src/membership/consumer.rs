use lobby_core::{MembershipEvent, MembershipStatus, ParticipantId, RoomId, RosterRow};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::Result;
use crate::membership::RosterSource;
use crate::mesh::MeshCoordinator;
use crate::peer::PeerConnectionManager;

/// What a membership change means for the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipAction {
    Joined(ParticipantId),
    /// A row already in the mesh changed, e.g. its ready flag.
    Updated(ParticipantId),
    /// A pending participant was let in by the host.
    Approved(ParticipantId),
    Left(ParticipantId),
    /// The local participant's own row is gone.
    Kicked,
}

/// Turns the room's membership feed into mesh changes.
pub struct MembershipEventConsumer {
    source: Arc<dyn RosterSource>,
    room: RoomId,
    local_id: ParticipantId,
    listed: bool,
    /// Remote rows already reported as joined.
    seen: HashSet<ParticipantId>,
}

impl MembershipEventConsumer {
    pub fn new(source: Arc<dyn RosterSource>, room: RoomId, local_id: ParticipantId) -> Self {
        Self {
            source,
            room,
            local_id,
            listed: false,
            seen: HashSet::new(),
        }
    }

    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<MembershipEvent>> {
        self.source.subscribe(&self.room).await
    }

    /// Pure classification of one event.
    pub fn classify(&self, event: &MembershipEvent) -> MembershipAction {
        match event {
            MembershipEvent::Delete(row) if row.participant_id == self.local_id => {
                MembershipAction::Kicked
            }
            MembershipEvent::Delete(row) => MembershipAction::Left(row.participant_id.clone()),
            MembershipEvent::Update(row) if row.status == MembershipStatus::Approved => {
                MembershipAction::Approved(row.participant_id.clone())
            }
            MembershipEvent::Insert(row) | MembershipEvent::Update(row) => {
                MembershipAction::Joined(row.participant_id.clone())
            }
        }
    }

    /// Applies one event to the mesh. Departures tear down only the departing
    /// participant's link; a kick is left to the caller, which ends the
    /// session.
    pub async fn dispatch(
        &mut self,
        event: &MembershipEvent,
        mesh: &mut MeshCoordinator,
        peers: &mut PeerConnectionManager,
    ) -> MembershipAction {
        let action = match self.classify(event) {
            MembershipAction::Joined(id) if id != self.local_id && !self.seen.insert(id.clone()) => {
                MembershipAction::Updated(id)
            }
            MembershipAction::Approved(id) => {
                self.seen.insert(id.clone());
                MembershipAction::Approved(id)
            }
            action => action,
        };
        debug!("Membership event in {}: {:?}", self.room, action);
        match &action {
            MembershipAction::Joined(id)
            | MembershipAction::Updated(id)
            | MembershipAction::Approved(id) => {
                if *id == self.local_id {
                    self.listed = true;
                } else {
                    mesh.peer_joined(peers, id).await;
                }
            }
            MembershipAction::Left(id) => {
                self.seen.remove(id);
                mesh.peer_left(peers, id).await
            }
            MembershipAction::Kicked => info!("Removed from room {}", self.room),
        }
        action
    }

    /// Fetches the roster and aligns the mesh with it: new rows join, known
    /// peers missing from it leave. Returns the actions taken, ending with
    /// `Kicked` if the local participant was listed before and no longer is.
    pub async fn reconcile(
        &mut self,
        mesh: &mut MeshCoordinator,
        peers: &mut PeerConnectionManager,
    ) -> Result<Vec<MembershipAction>> {
        let rows = self.source.fetch_roster(&self.room).await?;
        Ok(self.apply_roster(&rows, mesh, peers).await)
    }

    async fn apply_roster(
        &mut self,
        rows: &[RosterRow],
        mesh: &mut MeshCoordinator,
        peers: &mut PeerConnectionManager,
    ) -> Vec<MembershipAction> {
        let mut actions = Vec::new();
        let present: HashSet<_> = rows.iter().map(|r| r.participant_id.clone()).collect();

        for gone in mesh.known_peers() {
            if !present.contains(&gone) {
                self.seen.remove(&gone);
                mesh.peer_left(peers, &gone).await;
                actions.push(MembershipAction::Left(gone));
            }
        }

        for row in rows {
            if row.participant_id == self.local_id {
                continue;
            }
            if self.seen.insert(row.participant_id.clone()) {
                actions.push(MembershipAction::Joined(row.participant_id.clone()));
            }
            mesh.peer_joined(peers, &row.participant_id).await;
        }

        let listed_now = present.contains(&self.local_id);
        if self.listed && !listed_now {
            actions.push(MembershipAction::Kicked);
        }
        self.listed = listed_now;
        actions
    }
}
