// Speech Synthesizer Port
// Abstraction over the platform's text-to-speech capability

use crate::domain::{AudioSettings, VoiceCandidate};
use async_trait::async_trait;
use thiserror::Error;

/// One synthesis request: text plus the prosody it must be spoken with
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 language tag the text is written in
    pub language: String,
    /// Resolved voice, or `None` for the engine default
    pub voice: Option<VoiceCandidate>,
    pub settings: AudioSettings,
}

impl Utterance {
    pub fn new(text: impl Into<String>, settings: AudioSettings) -> Self {
        Self {
            text: text.into(),
            language: "id-ID".to_string(),
            voice: None,
            settings,
        }
    }

    pub fn with_voice(mut self, voice: Option<VoiceCandidate>) -> Self {
        self.voice = voice;
        self
    }
}

/// Speech synthesis errors
#[derive(Error, Debug)]
pub enum SpeechError {
    /// The platform has no usable synthesis engine. Degraded but
    /// non-fatal: the chime alone still announces the call.
    #[error("Speech engine unavailable")]
    EngineUnavailable,

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Speech synthesis trait.
///
/// `speak` resolves when the utterance has fully played out; there is
/// no cancellation and no timeout. A hung engine stalls the caller
/// (accepted: announcements are short and local).
///
/// Implementations:
/// - EspeakSynthesizer (infra-audio): espeak-ng subprocess
/// - NullSpeechSynthesizer (infra-audio): silent, reports unavailable
/// - mocks::MockSpeechSynthesizer: records utterances with timings
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices the engine currently offers (may be empty)
    async fn voices(&self) -> Result<Vec<VoiceCandidate>, SpeechError>;

    /// Synthesize and play one utterance to completion
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Whether an engine is present at all
    fn is_available(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Mock synthesizer behavior
    #[derive(Debug, Clone)]
    pub enum MockSpeechBehavior {
        /// Speak takes `duration` of (virtual) time, then succeeds
        Success { duration: Duration },
        /// Speak fails after spawning
        Fail(String),
        /// No engine present; `speak` errors, `is_available` is false
        Unavailable,
    }

    /// What the mock "spoke" and when
    #[derive(Debug, Clone)]
    pub struct SpokenRecord {
        pub text: String,
        pub voice_id: Option<String>,
        pub started_at: Instant,
        pub finished_at: Instant,
    }

    /// Mock speech synthesizer for testing.
    ///
    /// Timings use tokio time, so `start_paused` tests can assert
    /// ordering and overlap deterministically.
    pub struct MockSpeechSynthesizer {
        behavior: Arc<Mutex<MockSpeechBehavior>>,
        voices: Arc<Mutex<Vec<VoiceCandidate>>>,
        /// `voices()` errors this many times before serving the list
        voice_list_failures: Arc<Mutex<u32>>,
        spoken: Arc<Mutex<Vec<SpokenRecord>>>,
    }

    impl MockSpeechSynthesizer {
        pub fn new(behavior: MockSpeechBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                voices: Arc::new(Mutex::new(Vec::new())),
                voice_list_failures: Arc::new(Mutex::new(0)),
                spoken: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Success with a 2s simulated utterance
        pub fn new_success() -> Self {
            Self::new(MockSpeechBehavior::Success {
                duration: Duration::from_secs(2),
            })
        }

        pub fn new_unavailable() -> Self {
            Self::new(MockSpeechBehavior::Unavailable)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockSpeechBehavior::Fail(message.into()))
        }

        pub fn with_voices(self, voices: Vec<VoiceCandidate>) -> Self {
            *self.voices.lock().unwrap() = voices;
            self
        }

        /// Make the next `count` calls to `voices()` fail, simulating
        /// an engine whose list populates late.
        pub fn with_voice_list_failures(self, count: u32) -> Self {
            *self.voice_list_failures.lock().unwrap() = count;
            self
        }

        pub fn spoken(&self) -> Vec<SpokenRecord> {
            self.spoken.lock().unwrap().clone()
        }

        pub fn spoken_texts(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSpeechSynthesizer {
        async fn voices(&self) -> Result<Vec<VoiceCandidate>, SpeechError> {
            if matches!(*self.behavior.lock().unwrap(), MockSpeechBehavior::Unavailable) {
                return Err(SpeechError::EngineUnavailable);
            }
            {
                let mut failures = self.voice_list_failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(SpeechError::SynthesisFailed("voice list not ready".into()));
                }
            }
            Ok(self.voices.lock().unwrap().clone())
        }

        async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockSpeechBehavior::Success { duration } => {
                    let started_at = Instant::now();
                    tokio::time::sleep(duration).await;
                    self.spoken.lock().unwrap().push(SpokenRecord {
                        text: utterance.text.clone(),
                        voice_id: utterance.voice.as_ref().map(|v| v.id.clone()),
                        started_at,
                        finished_at: Instant::now(),
                    });
                    Ok(())
                }
                MockSpeechBehavior::Fail(msg) => Err(SpeechError::SynthesisFailed(msg)),
                MockSpeechBehavior::Unavailable => Err(SpeechError::EngineUnavailable),
            }
        }

        fn is_available(&self) -> bool {
            !matches!(*self.behavior.lock().unwrap(), MockSpeechBehavior::Unavailable)
        }
    }
}
