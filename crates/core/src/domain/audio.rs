// Audio Settings & Voice Domain Model

use serde::{Deserialize, Serialize};

/// Allowed range for pitch and rate multipliers
pub const PROSODY_RANGE: (f32, f32) = (0.5, 2.0);

/// Speech prosody configuration set from the admin panel.
///
/// An empty `voice_id` means "no explicit voice configured"; resolution
/// then walks the locale fallback chain. The value travels inside every
/// announcement job, so a settings change never affects a cycle already
/// in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default, rename = "voiceURI", alias = "voice_id")]
    pub voice_id: String,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_pitch() -> f32 {
    1.1
}

fn default_rate() -> f32 {
    0.85
}

fn default_volume() -> f32 {
    1.0
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            pitch: default_pitch(),
            rate: default_rate(),
            volume: default_volume(),
        }
    }
}

impl AudioSettings {
    /// Clamp every field into its admissible range.
    ///
    /// Pitch and rate live in [0.5, 2.0], volume in [0.0, 1.0]; NaN
    /// collapses to the field default.
    pub fn clamped(mut self) -> Self {
        let (lo, hi) = PROSODY_RANGE;
        self.pitch = clamp_or(self.pitch, lo, hi, default_pitch());
        self.rate = clamp_or(self.rate, lo, hi, default_rate());
        self.volume = clamp_or(self.volume, 0.0, 1.0, default_volume());
        self
    }
}

fn clamp_or(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

/// One voice offered by the speech engine (read-only, engine-owned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCandidate {
    /// Stable identity used for exact-match configuration
    pub id: String,
    /// Display name shown to the admin (matched for vendor markers)
    pub name: String,
    /// BCP-47-ish language tag, precision varies per engine
    pub language: String,
}

impl VoiceCandidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }
}
