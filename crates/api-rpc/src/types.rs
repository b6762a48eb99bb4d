//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use loket_core::domain::{AudioSettings, QueueEvent, VoiceCandidate};
use serde::{Deserialize, Serialize};

/// queue.call.v1 - Call the next number on a line
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub line: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    pub line: String,
    pub number: u32,
    pub ticket: String,
    pub announced: bool,
}

/// queue.recall.v1 - Repeat the current number on a line
#[derive(Debug, Deserialize)]
pub struct RecallRequest {
    pub line: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecallResponse {
    pub line: String,
    /// `null` when the line is still at zero and there is nothing to repeat
    pub number: Option<u32>,
    pub ticket: Option<String>,
    pub announced: bool,
}

/// queue.adjust.v1 - Apply an operator correction to a line
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub line: String,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustResponse {
    pub line: String,
    pub number: u32,
    pub announced: bool,
}

/// queue.reset.v1 - Reset a line to zero
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub line: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub line: String,
    pub number: u32,
}

/// queue.state.v1 - Read both counters
#[derive(Debug, Deserialize)]
pub struct StateRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub teller: u32,
    pub cs: u32,
}

/// queue.events.v1 - Long-poll the durable event feed
#[derive(Debug, Deserialize)]
pub struct EventsRequest {
    /// Resume cursor; 0 starts from the beginning of the feed
    #[serde(default)]
    pub after_seq: i64,
    /// How long to hold the request open waiting for news, in ms.
    /// 0 returns immediately; capped server-side.
    #[serde(default)]
    pub wait_ms: u64,
    /// Page size; 0 or absent means the server default, capped
    /// server-side.
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Vec<QueueEvent>,
    pub latest_seq: i64,
}

/// content.get.v1 - Read the full content snapshot
#[derive(Debug, Deserialize)]
pub struct ContentGetRequest {
    // No parameters needed
}

/// content.save.v1 - Persist an edited content snapshot
#[derive(Debug, Deserialize)]
pub struct ContentSaveRequest {
    pub snapshot: serde_json::Value,
    /// When true the snapshot's queue section overwrites the live
    /// counters. Defaults to false so a stale editing session cannot
    /// roll the queue back.
    #[serde(default)]
    pub apply_queue: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub snapshot: serde_json::Value,
}

/// audio.get.v1 / audio.set.v1 - Announcement voice settings
#[derive(Debug, Deserialize)]
pub struct AudioGetRequest {
    // No parameters needed
}

#[derive(Debug, Deserialize)]
pub struct AudioSetRequest {
    pub settings: AudioSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioResponse {
    pub settings: AudioSettings,
}

/// voices.list.v1 - Voices the speech engine offers
#[derive(Debug, Deserialize)]
pub struct VoicesRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceCandidate>,
    pub available: bool,
}

/// announce.test.v1 - Speak the line's current number without advancing
#[derive(Debug, Deserialize)]
pub struct AnnounceTestRequest {
    #[serde(default = "default_test_line")]
    pub line: String,
}

fn default_test_line() -> String {
    "teller".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnounceTestResponse {
    pub line: String,
    pub announced: bool,
}

/// system.status.v1 - Daemon health snapshot
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: i64,
    pub engine_available: bool,
    pub announcer_state: String,
    pub pending_announcements: usize,
    pub latest_seq: i64,
}
