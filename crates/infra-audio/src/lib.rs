// Loket Infrastructure - Audio Adapters
// Implements: ChimePlayer (cpal), SpeechSynthesizer (espeak-ng)

mod chime_cpal;
mod null;
mod speech_espeak;

pub use chime_cpal::CpalChimePlayer;
pub use null::{NullChimePlayer, NullSpeechSynthesizer};
pub use speech_espeak::{EspeakSynthesizer, ESPEAK_BIN_ENV};
