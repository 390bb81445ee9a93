use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::Result;
use crate::media::AudioConstraints;

/// The one local audio stream of a session, attached to every peer link.
///
/// Clones share the track and the mute flag, so muting through any clone
/// silences every link at once without renegotiating.
#[derive(Clone)]
pub struct LocalStream {
    track: Arc<TrackLocalStaticSample>,
    constraints: AudioConstraints,
    muted: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl LocalStream {
    pub fn new(track: Arc<TrackLocalStaticSample>, constraints: AudioConstraints) -> Self {
        Self {
            track,
            constraints,
            muted: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    /// Processing the capture pipeline was asked to apply.
    pub fn constraints(&self) -> &AudioConstraints {
        &self.constraints
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Releases the stream. Later writes are dropped.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Pushes one encoded frame to every link. Returns `false` when the frame
    /// was dropped because the stream is muted or stopped.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<bool> {
        if self.is_muted() || self.is_stopped() {
            return Ok(false);
        }
        self.track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(true)
    }
}
