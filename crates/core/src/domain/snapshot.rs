// Persisted Content Snapshot

use crate::domain::{AudioSettings, QueueState};
use serde::{Deserialize, Serialize};

/// The whole persisted content document.
///
/// The engine owns `queue` and `audio`; every other top-level field
/// (branding, promos, rate tables, ...) is opaque and must round-trip
/// through load/save untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub queue: QueueState,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Snapshot {
    /// Parse a raw document, hydrating missing engine sections with defaults
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn into_value(self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn opaque_fields_pass_through() {
        let doc = json!({
            "queue": {"teller": 4, "cs": 2},
            "audio": {"voiceURI": "", "pitch": 1.1, "rate": 0.85, "volume": 1.0},
            "logo": "data:image/png;base64,xyz",
            "promos": [{"title": "Tabungan Ceria"}],
        });
        let snapshot = Snapshot::from_value(doc.clone()).unwrap();
        assert_eq!(snapshot.queue, QueueState::new(4, 2));
        assert_eq!(snapshot.extra["logo"], json!("data:image/png;base64,xyz"));

        let back = snapshot.into_value().unwrap();
        assert_eq!(back["promos"], doc["promos"]);
        assert_eq!(back["queue"]["teller"], json!(4));
    }

    #[test]
    fn empty_document_hydrates_defaults() {
        let snapshot = Snapshot::from_value(serde_json::json!({})).unwrap();
        assert_eq!(snapshot.queue, QueueState::default());
        assert_eq!(snapshot.audio, AudioSettings::default());
        assert!(snapshot.extra.is_empty());
    }
}
