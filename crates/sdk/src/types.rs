//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate. The SDK stays
//! decoupled from the daemon's internal crates, so the wire shapes are
//! declared again here.

use serde::{Deserialize, Serialize};

/// Result of queue.call.v1
#[derive(Debug, Clone, Deserialize)]
pub struct CallResponse {
    pub line: String,
    pub number: u32,
    /// Display label, e.g. `A-007`
    pub ticket: String,
    pub announced: bool,
}

/// Result of queue.recall.v1
#[derive(Debug, Clone, Deserialize)]
pub struct RecallResponse {
    pub line: String,
    /// `None` when the line is still at zero
    pub number: Option<u32>,
    pub ticket: Option<String>,
    pub announced: bool,
}

/// Result of queue.adjust.v1
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustResponse {
    pub line: String,
    pub number: u32,
    pub announced: bool,
}

/// Result of queue.reset.v1
#[derive(Debug, Clone, Deserialize)]
pub struct ResetResponse {
    pub line: String,
    pub number: u32,
}

/// Result of queue.state.v1
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StateResponse {
    pub teller: u32,
    pub cs: u32,
}

/// What happened on the queue, as recorded in the durable feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Called,
    Adjusted,
    Reset,
    Recalled,
    /// Kinds this SDK version does not know yet
    #[serde(other)]
    Unknown,
}

/// One entry from the queue event feed
#[derive(Debug, Clone, Deserialize)]
pub struct QueueEvent {
    pub seq: i64,
    pub line: String,
    pub kind: EventKind,
    pub number: u32,
    /// Daemon clock, milliseconds since the Unix epoch
    pub at_ms: i64,
}

/// Result of queue.events.v1
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<QueueEvent>,
    pub latest_seq: i64,
}

/// Result of content.get.v1 and content.save.v1
#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    /// The full content document; engine-owned sections are `queue`
    /// and `audio`, everything else passes through opaquely
    pub snapshot: serde_json::Value,
}

/// Announcement voice settings as stored by the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Engine voice identifier; empty string means engine default
    #[serde(rename = "voiceURI", default)]
    pub voice_id: String,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

/// Result of audio.get.v1 and audio.set.v1
#[derive(Debug, Clone, Deserialize)]
pub struct AudioResponse {
    pub settings: AudioSettings,
}

/// One voice offered by the speech engine
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Result of voices.list.v1
#[derive(Debug, Clone, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
    pub available: bool,
}

/// Result of announce.test.v1
#[derive(Debug, Clone, Deserialize)]
pub struct AnnounceTestResponse {
    pub line: String,
    pub announced: bool,
}

/// Result of system.status.v1
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: i64,
    pub engine_available: bool,
    pub announcer_state: String,
    pub pending_announcements: usize,
    pub latest_seq: i64,
}
