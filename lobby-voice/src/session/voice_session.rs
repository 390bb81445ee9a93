use lobby_core::{ChatMessage, Envelope, MembershipEvent, Participant, RoomId};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::chat::RoomChatChannel;
use crate::membership::{MembershipAction, MembershipEventConsumer};
use crate::mesh::MeshCoordinator;
use crate::peer::{PeerConnectionManager, PeerEvent, PeerOutcome};
use crate::session::{ChannelKind, SessionCommand, SessionDeps, SessionHandle, SessionNotice, SessionParams};
use crate::signaling::SignalingChannel;
use crate::transport::Subscription;
use crate::{Result, VoiceConfig, VoiceError};

const COMMAND_BUFFER: usize = 64;

/// One participant's presence in one room: voice mesh, chat and membership.
///
/// Every input (host commands, signaling, chat, membership changes,
/// media-connection events and the sweep timer) is handled by a single loop,
/// one at a time, so the peer registry needs no locking.
pub struct VoiceSession {
    local: Participant,
    room: RoomId,
    config: VoiceConfig,

    signaling: SignalingChannel,
    signaling_sub: Option<Subscription>,
    peers: PeerConnectionManager,
    mesh: MeshCoordinator,
    chat: RoomChatChannel,
    membership: MembershipEventConsumer,
    membership_rx: Option<mpsc::UnboundedReceiver<MembershipEvent>>,

    command_rx: mpsc::Receiver<SessionCommand>,
    peer_events_rx: mpsc::UnboundedReceiver<PeerEvent>,
    notices: mpsc::UnboundedSender<SessionNotice>,
    timeline: Vec<ChatMessage>,
}

impl VoiceSession {
    /// Acquires the microphone, subscribes to the room's channels, announces
    /// the local participant and links up with the current roster.
    ///
    /// Failing to acquire audio does not fail the join: voice is disabled and
    /// [`SessionNotice::MediaUnavailable`] is emitted. Subscriptions that
    /// cannot be opened are retried by the sweep.
    pub async fn join(
        params: SessionParams,
        deps: SessionDeps,
    ) -> Result<(Self, SessionHandle, mpsc::UnboundedReceiver<SessionNotice>)> {
        let SessionParams {
            room,
            participant,
            config,
        } = params;
        if participant.id.as_str().is_empty() {
            return Err(VoiceError::InvalidParams("participant id is empty".into()));
        }
        if room.as_str().is_empty() {
            return Err(VoiceError::InvalidParams("room id is empty".into()));
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let (events_tx, peer_events_rx) = mpsc::unbounded_channel();

        let local_stream = match deps.media.acquire(&config.audio).await {
            Ok(stream) => {
                stream.set_muted(participant.muted);
                Some(stream)
            }
            Err(e) => {
                warn!("Joining {} without voice: {}", room, e);
                let _ = notices.send(SessionNotice::MediaUnavailable(e.to_string()));
                None
            }
        };

        let local_id = participant.id.clone();
        let signaling = SignalingChannel::new(deps.bus.clone(), &room, local_id.clone());
        let peers = PeerConnectionManager::new(
            local_id.clone(),
            deps.connector,
            Arc::new(signaling.clone()),
            local_stream,
            events_tx,
        );
        let mesh = MeshCoordinator::new(local_id.clone(), config.handshake_retries);
        let chat = RoomChatChannel::new(
            deps.bus,
            &room,
            local_id.clone(),
            participant.display_name.clone(),
        );
        let membership = MembershipEventConsumer::new(deps.roster, room.clone(), local_id);

        let mut session = Self {
            local: participant,
            room,
            config,
            signaling,
            signaling_sub: None,
            peers,
            mesh,
            chat,
            membership,
            membership_rx: None,
            command_rx,
            peer_events_rx,
            notices,
            timeline: Vec::new(),
        };

        // Subscribe to everything before fetching the roster: no membership
        // change is missed, and answers to the offers it triggers arrive on a
        // live subscription.
        session.subscribe_membership(false).await;
        session.restore_signaling(false).await;
        session.restore_chat(false).await;
        // Kicked needs an earlier listing of the local row; nothing has been
        // listed before the first roster read.
        let joined = session.reconcile_roster().await;
        debug_assert!(joined.is_continue());

        info!(
            "{} joined room {} (voice {})",
            session.local.id,
            session.room,
            if session.peers.voice_enabled() { "on" } else { "off" }
        );
        Ok((session, SessionHandle::new(command_tx), notice_rx))
    }

    /// Joins and runs the session on its own task.
    pub async fn start(
        params: SessionParams,
        deps: SessionDeps,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionNotice>, JoinHandle<()>)> {
        let (session, handle, notices) = Self::join(params, deps).await?;
        let task = tokio::spawn(session.run());
        Ok((handle, notices, task))
    }

    /// The session loop. Returns after leaving, being kicked, or once every
    /// [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        info!("Session loop for {} in {} started", self.local.id, self.room);

        let mut sweep = tokio::time::interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Leave(done)) => {
                            self.shutdown().await;
                            let _ = done.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped, leaving {}", self.room);
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                envelope = next_envelope(&mut self.signaling_sub) => {
                    match envelope {
                        Some(e) => self.handle_signal(e).await,
                        None => self.channel_lost(ChannelKind::Signaling),
                    }
                }

                evt = self.peer_events_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_peer_event(e).await;
                    }
                }

                message = self.chat.next_message() => {
                    match message {
                        Some(m) => self.handle_chat(m),
                        None => self.channel_lost(ChannelKind::Chat),
                    }
                }

                event = next_membership(&mut self.membership_rx) => {
                    match event {
                        Some(e) => {
                            if self.handle_membership(e).await.is_break() {
                                break;
                            }
                        }
                        None => {
                            self.membership_rx = None;
                            self.channel_lost(ChannelKind::Membership);
                        }
                    }
                }

                _ = sweep.tick() => {
                    if self.sweep().await.is_break() {
                        break;
                    }
                }
            }
        }

        let _ = self.notices.send(SessionNotice::Closed);
        info!("Session loop for {} in {} finished", self.local.id, self.room);
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Mute(muted) => {
                self.local.muted = muted;
                self.peers.mute(muted);
                debug!("{} is now {}", self.local.id, if muted { "muted" } else { "unmuted" });
            }
            SessionCommand::SendChat(text) => {
                if let Err(e) = self.chat.send(&text).await {
                    warn!("Chat message not sent: {}", e);
                }
            }
            SessionCommand::Links(reply) => {
                let _ = reply.send(self.peers.links());
            }
            SessionCommand::Timeline(reply) => {
                let _ = reply.send(self.timeline.clone());
            }
            // Handled by the loop.
            SessionCommand::Leave(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn handle_signal(&mut self, envelope: Envelope) {
        if !self.signaling.accepts(&envelope) {
            return;
        }
        self.mesh.handle_signal(&mut self.peers, envelope).await;
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        let Some(outcome) = self.peers.handle_event(event).await else {
            return;
        };
        match outcome {
            PeerOutcome::Connected(peer_id) => {
                self.mesh.peer_connected(&peer_id);
                self.notify(SessionNotice::PeerConnected(peer_id));
            }
            PeerOutcome::Lost { peer_id, role } => {
                self.notify(SessionNotice::PeerUnreachable(peer_id.clone()));
                self.mesh.link_failed(&mut self.peers, &peer_id, role).await;
            }
            PeerOutcome::RemoteTrack(peer_id, track) => {
                self.notify(SessionNotice::RemoteTrack { peer_id, track });
            }
        }
    }

    fn handle_chat(&mut self, message: ChatMessage) {
        self.timeline.push(message.clone());
        self.notify(SessionNotice::Chat(message));
    }

    async fn handle_membership(&mut self, event: MembershipEvent) -> ControlFlow<()> {
        let action = self
            .membership
            .dispatch(&event, &mut self.mesh, &mut self.peers)
            .await;
        self.report_membership(action).await
    }

    async fn report_membership(&mut self, action: MembershipAction) -> ControlFlow<()> {
        match action {
            MembershipAction::Joined(id) if id != self.local.id => {
                self.notify(SessionNotice::PeerJoined(id))
            }
            // For the local row this means the host accepted our request.
            MembershipAction::Approved(id) => self.notify(SessionNotice::PeerApproved(id)),
            MembershipAction::Joined(_) | MembershipAction::Updated(_) => {}
            MembershipAction::Left(id) => self.notify(SessionNotice::PeerLeft(id)),
            MembershipAction::Kicked => {
                warn!("{} was removed from room {}", self.local.id, self.room);
                self.notify(SessionNotice::Kicked);
                self.shutdown().await;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Handshake timeouts, then resubscription of lost channels.
    async fn sweep(&mut self) -> ControlFlow<()> {
        let unreachable = self
            .mesh
            .sweep(&mut self.peers, self.config.handshake_timeout())
            .await;
        for peer_id in unreachable {
            self.notify(SessionNotice::PeerUnreachable(peer_id));
        }

        if self.membership_rx.is_none()
            && self.subscribe_membership(true).await
            && self.reconcile_roster().await.is_break()
        {
            return ControlFlow::Break(());
        }
        if self.signaling_sub.is_none() {
            self.restore_signaling(true).await;
        }
        if !self.chat.is_connected() {
            self.restore_chat(true).await;
        }
        ControlFlow::Continue(())
    }

    async fn subscribe_membership(&mut self, reconnecting: bool) -> bool {
        match self.membership.subscribe().await {
            Ok(rx) => {
                self.membership_rx = Some(rx);
                if reconnecting {
                    self.notify(SessionNotice::TransportRestored(ChannelKind::Membership));
                }
                true
            }
            Err(e) if !reconnecting => {
                warn!("Membership feed for {} unavailable: {}", self.room, e);
                self.notify(SessionNotice::TransportDisconnected(ChannelKind::Membership));
                false
            }
            Err(e) => {
                debug!("Membership resubscribe failed: {}", e);
                false
            }
        }
    }

    /// Aligns the mesh with a fresh roster snapshot.
    async fn reconcile_roster(&mut self) -> ControlFlow<()> {
        let actions = match self
            .membership
            .reconcile(&mut self.mesh, &mut self.peers)
            .await
        {
            Ok(actions) => actions,
            Err(e) => {
                warn!("Roster fetch for {} failed: {}", self.room, e);
                return ControlFlow::Continue(());
            }
        };
        for action in actions {
            if self.report_membership(action).await.is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn restore_signaling(&mut self, reconnecting: bool) {
        if !self.peers.voice_enabled() {
            return;
        }
        match self.signaling.subscribe().await {
            Ok(sub) => {
                self.signaling_sub = Some(sub);
                self.peers.announce(None).await;
                if reconnecting {
                    self.notify(SessionNotice::TransportRestored(ChannelKind::Signaling));
                }
            }
            Err(e) if !reconnecting => {
                warn!("Signaling for {} unavailable: {}", self.room, e);
                self.notify(SessionNotice::TransportDisconnected(ChannelKind::Signaling));
            }
            Err(e) => debug!("Signaling resubscribe failed: {}", e),
        }
    }

    async fn restore_chat(&mut self, reconnecting: bool) {
        match self.chat.connect().await {
            Ok(()) if reconnecting => {
                self.notify(SessionNotice::TransportRestored(ChannelKind::Chat))
            }
            Ok(()) => {}
            Err(e) if !reconnecting => {
                warn!("Chat for {} unavailable: {}", self.room, e);
                self.notify(SessionNotice::TransportDisconnected(ChannelKind::Chat));
            }
            Err(e) => debug!("Chat resubscribe failed: {}", e),
        }
    }

    fn channel_lost(&mut self, kind: ChannelKind) {
        warn!("{} channel of {} lost, will resubscribe", kind, self.room);
        if kind == ChannelKind::Signaling {
            self.signaling_sub = None;
        }
        self.notify(SessionNotice::TransportDisconnected(kind));
    }

    /// Closes every link, drops every subscription and releases the microphone.
    async fn shutdown(&mut self) {
        self.peers.teardown_all().await;
        self.signaling_sub = None;
        self.membership_rx = None;
        self.chat.close();
        self.peers.release_media();
        info!("{} left room {}", self.local.id, self.room);
    }

    fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice);
    }
}

async fn next_envelope(sub: &mut Option<Subscription>) -> Option<Envelope> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_membership(
    rx: &mut Option<mpsc::UnboundedReceiver<MembershipEvent>>,
) -> Option<MembershipEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
