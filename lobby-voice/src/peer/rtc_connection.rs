use anyhow::Context;
use async_trait::async_trait;
use lobby_core::IceServerConfig;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::Result;
use crate::media::LocalStream;
use crate::peer::{LinkTag, MediaConnection, PeerConnector, PeerEvent, PeerEventKind, TransportState};

/// [`PeerConnector`] backed by `webrtc`. One API object (codecs and
/// interceptors) is shared by every connection of the session.
pub struct RtcPeerConnector {
    api: Arc<API>,
    ice_servers: Vec<RTCIceServer>,
}

impl RtcPeerConnector {
    pub fn new(ice_servers: &[IceServerConfig]) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            api: Arc::new(api),
            ice_servers,
        })
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self.ice_servers.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for RtcPeerConnector {
    async fn connect(
        &self,
        tag: LinkTag,
        local: &LocalStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> anyhow::Result<Box<dyn MediaConnection>> {
        let pc = Arc::new(
            self.api
                .new_peer_connection(self.rtc_config())
                .await
                .context("Failed to create peer connection")?,
        );

        let track: Arc<dyn TrackLocal + Send + Sync> = local.track();
        let sender = pc
            .add_track(track)
            .await
            .context("Failed to attach local audio track")?;

        // RTCP has to be read for the interceptors to run.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });

        let state_tx = events.clone();
        let state_tag = tag.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let tag = state_tag.clone();

            Box::pin(async move {
                info!("Peer connection to {} is now {}", tag.peer_id, s);
                let state = match s {
                    RTCPeerConnectionState::Connecting => TransportState::Connecting,
                    RTCPeerConnectionState::Connected => TransportState::Connected,
                    RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
                    RTCPeerConnectionState::Failed => TransportState::Failed,
                    RTCPeerConnectionState::Closed => TransportState::Closed,
                    _ => return,
                };
                let _ = tx.send(PeerEvent::new(tag, PeerEventKind::StateChanged(state)));
            })
        }));

        let ice_tx = events.clone();
        let ice_tag = tag.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let tag = ice_tag.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(json) = serde_json::to_string(&init) else {
                    return;
                };
                let _ = tx.send(PeerEvent::new(tag, PeerEventKind::CandidateGenerated(json)));
            })
        }));

        let track_tx = events;
        let track_tag = tag;
        pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let tag = track_tag.clone();

                Box::pin(async move {
                    debug!("Remote {} track from {}", track.kind(), tag.peer_id);
                    let _ = tx.send(PeerEvent::new(tag, PeerEventKind::RemoteTrack(track)));
                })
            },
        ));

        Ok(Box::new(RtcMediaConnection { pc }))
    }
}

pub struct RtcMediaConnection {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl MediaConnection for RtcMediaConnection {
    async fn create_offer(&self) -> anyhow::Result<String> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    async fn set_remote_offer(&self, sdp: String) -> anyhow::Result<()> {
        let desc = RTCSessionDescription::offer(sdp)?;
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    async fn create_answer(&self) -> anyhow::Result<String> {
        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(answer.sdp)
    }

    async fn set_remote_answer(&self, sdp: String) -> anyhow::Result<()> {
        let desc = RTCSessionDescription::answer(sdp)?;
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> anyhow::Result<()> {
        let init: RTCIceCandidateInit =
            serde_json::from_str(&candidate).context("Failed to parse ICE candidate JSON")?;
        self.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}
