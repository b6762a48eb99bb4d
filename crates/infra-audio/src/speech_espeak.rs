// Espeak speech synthesizer
// Drives an espeak-ng (or espeak) subprocess for spoken announcements

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use loket_core::domain::VoiceCandidate;
use loket_core::port::{SpeechError, SpeechSynthesizer, Utterance};

/// Overrides the engine binary, e.g. a full path to espeak-ng
pub const ESPEAK_BIN_ENV: &str = "LOKET_ESPEAK_BIN";

/// Probed in order when the override is unset
const ENGINE_CANDIDATES: &[&str] = &["espeak-ng", "espeak"];

/// Engine speed at rate 1.0, in words per minute (espeak's own default)
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const MIN_WORDS_PER_MINUTE: i64 = 80;
const MAX_WORDS_PER_MINUTE: i64 = 450;

/// Engine pitch at pitch 1.0, on espeak's 0-99 scale
const BASE_PITCH_LEVEL: f32 = 50.0;
const MAX_PITCH_LEVEL: i64 = 99;

/// Engine amplitude at volume 1.0, on espeak's 0-200 scale
const BASE_AMPLITUDE: f32 = 100.0;
const MAX_AMPLITUDE: i64 = 200;

/// Map the normalized rate onto espeak's words-per-minute scale.
fn words_per_minute(rate: f32) -> i64 {
    ((rate * BASE_WORDS_PER_MINUTE).round() as i64).clamp(MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE)
}

/// Map the normalized pitch onto espeak's 0-99 scale.
fn pitch_level(pitch: f32) -> i64 {
    ((pitch * BASE_PITCH_LEVEL).round() as i64).clamp(0, MAX_PITCH_LEVEL)
}

/// Map the normalized volume onto espeak's 0-200 amplitude scale.
fn amplitude(volume: f32) -> i64 {
    ((volume * BASE_AMPLITUDE).round() as i64).clamp(0, MAX_AMPLITUDE)
}

/// Reduce a BCP-47 tag to the bare language code espeak expects.
fn engine_language(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase()
}

/// Build the full argument list for one utterance.
///
/// The resolved voice's file identifier wins over the language tag; with
/// no resolved voice the engine picks its own default for the language.
fn build_args(utterance: &Utterance) -> Vec<String> {
    let voice = match &utterance.voice {
        Some(v) => v.id.clone(),
        None => engine_language(&utterance.language),
    };

    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        words_per_minute(utterance.settings.rate).to_string(),
        "-p".to_string(),
        pitch_level(utterance.settings.pitch).to_string(),
        "-a".to_string(),
        amplitude(utterance.settings.volume).to_string(),
        utterance.text.clone(),
    ]
}

/// Parse `espeak-ng --voices` output into voice candidates.
///
/// The listing is a fixed-header table:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  id              --/M      Indonesian         poetry/id
/// ```
///
/// The File column becomes the candidate id because it is what `-v`
/// accepts unambiguously.
fn parse_voice_listing(listing: &str) -> Vec<VoiceCandidate> {
    listing
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 5 || columns[0] == "Pty" {
                return None;
            }
            Some(VoiceCandidate {
                id: columns[4].to_string(),
                name: columns[3].to_string(),
                language: columns[1].to_string(),
            })
        })
        .collect()
}

/// Speech synthesizer backed by an espeak subprocess.
///
/// Each `speak` spawns one short-lived process and waits for it to exit,
/// which is when the audio has fully played out. There is no timeout:
/// announcements are a few seconds long and the engine is local.
pub struct EspeakSynthesizer {
    binary: Option<String>,
}

impl EspeakSynthesizer {
    /// Probe for a usable engine binary.
    ///
    /// Checks the override from `LOKET_ESPEAK_BIN` first, then the known
    /// engine names. A machine with no engine still gets a synthesizer;
    /// it reports unavailable and every announcement degrades to
    /// chime-only.
    pub async fn detect() -> Self {
        let mut candidates: Vec<String> = Vec::new();
        if let Ok(overridden) = std::env::var(ESPEAK_BIN_ENV) {
            if !overridden.is_empty() {
                candidates.push(overridden);
            }
        }
        candidates.extend(ENGINE_CANDIDATES.iter().map(|s| s.to_string()));

        for candidate in candidates {
            if probe_binary(&candidate).await {
                info!(binary = %candidate, "Speech engine detected");
                return Self {
                    binary: Some(candidate),
                };
            }
        }

        warn!("No speech engine found; announcements will be chime-only");
        Self { binary: None }
    }

    /// Build a synthesizer around a known binary without probing.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    fn binary(&self) -> Result<&str, SpeechError> {
        self.binary.as_deref().ok_or(SpeechError::EngineUnavailable)
    }
}

async fn probe_binary(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn voices(&self) -> Result<Vec<VoiceCandidate>, SpeechError> {
        let binary = self.binary()?;

        let output = Command::new(binary)
            .arg("--voices")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SpeechError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(SpeechError::SynthesisFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let voices = parse_voice_listing(&String::from_utf8_lossy(&output.stdout));
        debug!(count = voices.len(), "Listed engine voices");
        Ok(voices)
    }

    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let binary = self.binary()?;
        let args = build_args(utterance);

        debug!(
            binary = %binary,
            voice = ?utterance.voice.as_ref().map(|v| v.id.as_str()),
            chars = utterance.text.len(),
            "Speaking announcement"
        );

        let output = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SpeechError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(SpeechError::SynthesisFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
