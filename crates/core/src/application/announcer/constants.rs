// Announcer constants (no magic values in code)
use std::time::Duration;

/// First chime tone, G5 (Hz)
pub const CHIME_FIRST_TONE_HZ: f32 = 783.99;

/// Second chime tone, E5 (Hz)
pub const CHIME_SECOND_TONE_HZ: f32 = 659.25;

/// First tone rings for 1.2s
pub const CHIME_FIRST_TONE_SECS: f32 = 1.2;

/// Second tone rings for 1.5s
pub const CHIME_SECOND_TONE_SECS: f32 = 1.5;

/// Second tone starts 0.6s after the first
pub const CHIME_SECOND_TONE_OFFSET_SECS: f32 = 0.6;

/// Linear attack from silence to peak (50ms)
pub const CHIME_ATTACK_SECS: f32 = 0.05;

/// Peak tone amplitude
pub const CHIME_PEAK_AMPLITUDE: f32 = 0.5;

/// Amplitude the exponential decay ends at
pub const CHIME_TAIL_AMPLITUDE: f32 = 0.001;

/// Fixed wait for the chime to ring out before speech starts.
///
/// A timed wait, not an audio-completion callback: the cue spans 2.1s
/// of tone but rings out audibly by 1.8s, and a constant keeps the
/// cycle length device-independent. Known imprecision, kept on purpose.
pub const CHIME_WAIT: Duration = Duration::from_millis(1800);

/// Language every announcement is spoken in
pub const SPEECH_LANGUAGE: &str = "id-ID";
