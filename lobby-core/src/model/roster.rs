use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Rejected,
    Joined,
}

/// One membership row of a room, owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub is_ready: bool,
    pub status: MembershipStatus,
}

impl RosterRow {
    pub fn new(participant_id: impl Into<ParticipantId>, status: MembershipStatus) -> Self {
        Self {
            participant_id: participant_id.into(),
            is_host: false,
            is_ready: false,
            status,
        }
    }

    pub fn host(mut self) -> Self {
        self.is_host = true;
        self
    }
}

/// Change notification for a room's membership table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "row", rename_all = "UPPERCASE")]
pub enum MembershipEvent {
    Insert(RosterRow),
    Update(RosterRow),
    Delete(RosterRow),
}

impl MembershipEvent {
    pub fn row(&self) -> &RosterRow {
        match self {
            Self::Insert(row) | Self::Update(row) | Self::Delete(row) => row,
        }
    }
}
