//! Integration tests for lobby-voice.
//!
//! Tests are organized by functionality:
//! - `mesh_tests` - sessions building and keeping a full mesh
//! - `handshake_tests` - offer/answer/candidate races on a single manager
//! - `membership_tests` - joins, leaves, kicks and voiceless sessions
//! - `chat_tests` - room chat timelines
//! - `transport_tests` - losing and restoring subscriptions
//! - `rtc_tests` - the webrtc-backed connector

pub mod handshake_tests;
pub mod membership_tests;
pub mod rtc_tests;

use lobby_core::RoomId;
use lobby_voice::membership::MemoryRoster;
use lobby_voice::transport::MemoryBus;
use tracing::Level;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fresh bus, roster and room id.
pub fn create_test_room() -> (MemoryBus, MemoryRoster, RoomId) {
    (MemoryBus::new(), MemoryRoster::new(), RoomId::random())
}
