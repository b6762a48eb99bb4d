// Null audio adapters
// Silent stand-ins for muted daemons and headless test rigs

use async_trait::async_trait;
use tracing::debug;

use loket_core::domain::VoiceCandidate;
use loket_core::port::{ChimeError, ChimePlayer, SpeechError, SpeechSynthesizer, Utterance};

/// Chime player that discards every cue.
///
/// Announcement cycles keep their normal timing; only the sound is gone.
pub struct NullChimePlayer;

#[async_trait]
impl ChimePlayer for NullChimePlayer {
    async fn play(&self) -> Result<(), ChimeError> {
        debug!("Chime suppressed (muted)");
        Ok(())
    }
}

/// Synthesizer that reports no engine.
///
/// The announcer sees the same shape as a machine without espeak and
/// degrades every cycle to chime-only, which the null chime then mutes.
pub struct NullSpeechSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NullSpeechSynthesizer {
    async fn voices(&self) -> Result<Vec<VoiceCandidate>, SpeechError> {
        Ok(Vec::new())
    }

    async fn speak(&self, _utterance: &Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::EngineUnavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}
