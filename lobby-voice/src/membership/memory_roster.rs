use async_trait::async_trait;
use dashmap::DashMap;
use lobby_core::{MembershipEvent, MembershipStatus, ParticipantId, RosterRow, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::membership::RosterSource;

#[derive(Default)]
struct RoomTable {
    rows: Vec<RosterRow>,
    watchers: Vec<mpsc::UnboundedSender<MembershipEvent>>,
}

impl RoomTable {
    fn emit(&mut self, event: MembershipEvent) {
        self.watchers.retain(|w| w.send(event.clone()).is_ok());
    }
}

/// In-process membership table with a change feed, for hosts without a
/// database and for tests.
#[derive(Clone, Default)]
pub struct MemoryRoster {
    rooms: Arc<DashMap<RoomId, RoomTable>>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the row, or replaces the row of the same participant.
    pub fn upsert(&self, room: &RoomId, row: RosterRow) {
        let mut table = self.rooms.entry(room.clone()).or_default();
        let event = match table
            .rows
            .iter_mut()
            .find(|r| r.participant_id == row.participant_id)
        {
            Some(existing) => {
                *existing = row.clone();
                MembershipEvent::Update(row)
            }
            None => {
                table.rows.push(row.clone());
                MembershipEvent::Insert(row)
            }
        };
        table.emit(event);
    }

    pub fn set_status(
        &self,
        room: &RoomId,
        participant_id: &ParticipantId,
        status: MembershipStatus,
    ) -> bool {
        self.modify(room, participant_id, |row| row.status = status)
    }

    pub fn set_ready(&self, room: &RoomId, participant_id: &ParticipantId, ready: bool) -> bool {
        self.modify(room, participant_id, |row| row.is_ready = ready)
    }

    /// Deletes the participant's row. Used both for leaving and for kicks.
    pub fn remove(&self, room: &RoomId, participant_id: &ParticipantId) -> Option<RosterRow> {
        let mut table = self.rooms.get_mut(room)?;
        let index = table
            .rows
            .iter()
            .position(|r| &r.participant_id == participant_id)?;
        let row = table.rows.remove(index);
        table.emit(MembershipEvent::Delete(row.clone()));
        Some(row)
    }

    pub fn rows(&self, room: &RoomId) -> Vec<RosterRow> {
        self.rooms
            .get(room)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Ends every change feed of the room, as if the connection dropped.
    pub fn disconnect(&self, room: &RoomId) {
        if let Some(mut table) = self.rooms.get_mut(room) {
            debug!("Dropping {} membership watchers of {}", table.watchers.len(), room);
            table.watchers.clear();
        }
    }

    fn modify(
        &self,
        room: &RoomId,
        participant_id: &ParticipantId,
        f: impl FnOnce(&mut RosterRow),
    ) -> bool {
        let Some(mut table) = self.rooms.get_mut(room) else {
            return false;
        };
        let Some(row) = table
            .rows
            .iter_mut()
            .find(|r| &r.participant_id == participant_id)
        else {
            return false;
        };
        f(row);
        let event = MembershipEvent::Update(row.clone());
        table.emit(event);
        true
    }
}

#[async_trait]
impl RosterSource for MemoryRoster {
    async fn fetch_roster(&self, room: &RoomId) -> Result<Vec<RosterRow>> {
        Ok(self.rows(room))
    }

    async fn subscribe(&self, room: &RoomId) -> Result<mpsc::UnboundedReceiver<MembershipEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.entry(room.clone()).or_default().watchers.push(tx);
        Ok(rx)
    }
}
