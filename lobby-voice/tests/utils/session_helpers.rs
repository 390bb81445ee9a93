use lobby_core::{MembershipStatus, Participant, ParticipantId, RoomId, RosterRow};
use lobby_voice::media::{AudioConstraints, LocalStream, MediaSource, OpusTrackSource};
use lobby_voice::membership::MemoryRoster;
use lobby_voice::peer::{HandshakeState, LinkSnapshot, PeerConnectionManager, PeerEvent, PeerOutcome};
use lobby_voice::transport::MemoryBus;
use lobby_voice::{SessionDeps, SessionHandle, SessionNotice, SessionParams, VoiceConfig, VoiceSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

use crate::utils::{MockConnector, MockConnectorConfig, RecordingSignaling};

/// Session settings for tests: no STUN, default timeouts.
pub fn test_config() -> VoiceConfig {
    VoiceConfig {
        ice_servers: Vec::new(),
        ..VoiceConfig::default()
    }
}

pub async fn local_stream() -> LocalStream {
    OpusTrackSource::new("test")
        .acquire(&AudioConstraints::default())
        .await
        .expect("Failed to create local stream")
}

/// A manager wired to mocks, driven by hand.
pub struct ManagerFixture {
    pub manager: PeerConnectionManager,
    pub connector: MockConnector,
    pub signaling: RecordingSignaling,
    events: mpsc::UnboundedReceiver<PeerEvent>,
}

impl ManagerFixture {
    pub async fn new(local: &str) -> Self {
        let connector = MockConnector::with_config(
            local,
            MockConnectorConfig {
                candidates: 0,
                report_connected: false,
            },
        );
        Self::with_connector(local, connector).await
    }

    pub async fn with_connector(local: &str, connector: MockConnector) -> Self {
        let signaling = RecordingSignaling::new();
        let (tx, events) = mpsc::unbounded_channel();
        let manager = PeerConnectionManager::new(
            local.into(),
            Arc::new(connector.clone()),
            Arc::new(signaling.clone()),
            Some(local_stream().await),
            tx,
        );
        Self {
            manager,
            connector,
            signaling,
            events,
        }
    }

    /// Feeds every pending media-connection event into the manager.
    pub async fn pump(&mut self) -> Vec<PeerOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let Some(outcome) = self.manager.handle_event(event).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    pub fn state_of(&self, peer: &str) -> Option<HandshakeState> {
        self.manager.link_state(&ParticipantId::from(peer))
    }
}

/// A running session plus the mocks behind it.
pub struct TestParticipant {
    pub id: ParticipantId,
    pub handle: SessionHandle,
    pub notices: mpsc::UnboundedReceiver<SessionNotice>,
    pub connector: MockConnector,
    pub task: JoinHandle<()>,
}

impl TestParticipant {
    /// Polls until exactly `count` links exist and all are in `state`.
    pub async fn wait_for_links(&self, count: usize, state: HandshakeState, timeout_ms: u64) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Ok(links) = self.handle.links().await {
                if links.len() == count && links.iter().all(|l| l.state == state) {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn links(&self) -> Vec<LinkSnapshot> {
        self.handle.links().await.expect("Session ended")
    }

    /// Waits for the first notice matching `pred`, skipping the others.
    pub async fn wait_for_notice(
        &mut self,
        pred: impl Fn(&SessionNotice) -> bool,
        timeout_ms: u64,
    ) -> Option<SessionNotice> {
        let notices = &mut self.notices;
        timeout(Duration::from_millis(timeout_ms), async {
            while let Some(notice) = notices.recv().await {
                if pred(&notice) {
                    return Some(notice);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    /// Polls the chat timeline until it holds `count` messages.
    pub async fn wait_for_timeline(&self, count: usize, timeout_ms: u64) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let timeline = self.handle.timeline().await.unwrap_or_default();
            if timeline.len() >= count || Instant::now() >= deadline {
                return timeline.into_iter().map(|m| m.text).collect();
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Adds `id` to the roster and starts its session with mock connections.
pub async fn join_room(
    bus: &MemoryBus,
    roster: &MemoryRoster,
    room: &RoomId,
    id: &str,
) -> TestParticipant {
    join_room_with(
        bus,
        roster,
        room,
        id,
        test_config(),
        Arc::new(OpusTrackSource::new(id)),
    )
    .await
}

pub async fn join_room_with(
    bus: &MemoryBus,
    roster: &MemoryRoster,
    room: &RoomId,
    id: &str,
    config: VoiceConfig,
    media: Arc<dyn MediaSource>,
) -> TestParticipant {
    roster.upsert(room, RosterRow::new(id, MembershipStatus::Joined));

    let connector = MockConnector::new(id);
    let deps = SessionDeps {
        bus: Arc::new(bus.clone()),
        roster: Arc::new(roster.clone()),
        media,
        connector: Arc::new(connector.clone()),
    };
    let params = SessionParams::new(room.clone(), Participant::new(id, format!("Player {id}")))
        .with_config(config);

    let (handle, notices, task) = VoiceSession::start(params, deps)
        .await
        .expect("Failed to start session");

    TestParticipant {
        id: id.into(),
        handle,
        notices,
        connector,
        task,
    }
}
