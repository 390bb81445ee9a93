use lobby_core::IceServerConfig;
use serde::Deserialize;
use std::time::Duration;

use crate::media::AudioConstraints;

/// Session-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// STUN/TURN servers handed to every peer connection. Empty means LAN only.
    pub ice_servers: Vec<IceServerConfig>,
    /// How long a link may stay in `offering`, `awaiting-answer` or `answering`.
    pub handshake_timeout_ms: u64,
    /// Re-originations allowed after a handshake timeout or transport failure.
    pub handshake_retries: u8,
    /// Period of the timeout sweep and of resubscription attempts.
    pub sweep_interval_ms: u64,
    pub audio: AudioConstraints,
}

impl VoiceConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::defaults(),
            handshake_timeout_ms: 20_000,
            handshake_retries: 1,
            sweep_interval_ms: 1_000,
            audio: AudioConstraints::default(),
        }
    }
}
