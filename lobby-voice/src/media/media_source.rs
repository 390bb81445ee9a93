use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::media::LocalStream;
use crate::{Result, VoiceError};

/// Processing requested from the capture device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Where the local audio stream comes from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fails with [`VoiceError::MediaUnavailable`] when no stream can be opened.
    async fn acquire(&self, constraints: &AudioConstraints) -> Result<LocalStream>;
}

/// Opus sample track fed by the host's capture pipeline.
pub struct OpusTrackSource {
    stream_id: String,
}

impl OpusTrackSource {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

#[async_trait]
impl MediaSource for OpusTrackSource {
    async fn acquire(&self, constraints: &AudioConstraints) -> Result<LocalStream> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "audio".to_owned(),
            self.stream_id.clone(),
        ));
        info!(
            "Local audio track ready (aec={}, ns={}, agc={})",
            constraints.echo_cancellation, constraints.noise_suppression, constraints.auto_gain_control
        );
        Ok(LocalStream::new(track, constraints.clone()))
    }
}

/// A host without a capture device. Sessions built on it run chat and
/// membership only.
pub struct NoAudioDevice;

#[async_trait]
impl MediaSource for NoAudioDevice {
    async fn acquire(&self, _constraints: &AudioConstraints) -> Result<LocalStream> {
        Err(VoiceError::MediaUnavailable(
            "no capture device present".to_owned(),
        ))
    }
}
