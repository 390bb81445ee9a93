use async_trait::async_trait;
use lobby_core::{MembershipEvent, RosterRow, RoomId};
use tokio::sync::mpsc;

use crate::Result;

/// The persistence layer's view of room membership.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Current rows of the room.
    async fn fetch_roster(&self, room: &RoomId) -> Result<Vec<RosterRow>>;

    /// Change feed for the room. The receiver ends when the feed is lost.
    async fn subscribe(&self, room: &RoomId) -> Result<mpsc::UnboundedReceiver<MembershipEvent>>;
}
