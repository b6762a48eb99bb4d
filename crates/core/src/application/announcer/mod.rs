// Announcer - serialized chime + speech playback loop

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::voice;
use crate::domain::{Announcement, AudioSettings, VoiceCandidate};
use crate::port::{ChimePlayer, SpeechSynthesizer, Utterance};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{info, warn};

/// One queued announcement together with the prosody it was submitted
/// with. Settings are sampled at submit time, so an admin change never
/// alters a cycle that is already waiting.
#[derive(Debug, Clone)]
pub struct AnnouncementJob {
    pub announcement: Announcement,
    pub settings: AudioSettings,
}

/// Observable phase of the announcement cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncerState {
    Idle,
    PlayingChime,
    Speaking,
}

impl std::fmt::Display for AnnouncerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnouncerState::Idle => write!(f, "IDLE"),
            AnnouncerState::PlayingChime => write!(f, "PLAYING_CHIME"),
            AnnouncerState::Speaking => write!(f, "SPEAKING"),
        }
    }
}

/// Submission side of the announcer.
///
/// `submit` never blocks, never coalesces and never reorders: every
/// accepted job produces exactly one chime+speech cycle, in submission
/// order.
#[derive(Clone)]
pub struct AnnouncerHandle {
    tx: mpsc::UnboundedSender<AnnouncementJob>,
    state_rx: watch::Receiver<AnnouncerState>,
    pending: Arc<AtomicUsize>,
}

impl AnnouncerHandle {
    /// Queue a job; returns false once the announcer has stopped
    pub fn submit(&self, job: AnnouncementJob) -> bool {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_ok() {
            true
        } else {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            false
        }
    }

    /// Jobs queued but not yet started
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> AnnouncerState {
        *self.state_rx.borrow()
    }

    /// Watch channel following the cycle phases
    pub fn state_stream(&self) -> watch::Receiver<AnnouncerState> {
        self.state_rx.clone()
    }
}

/// The single worker that owns playback.
///
/// Exactly one announcement is in flight at any time; a new request
/// always waits for the in-flight cycle to finish. There is no
/// cancellation: an operator pressing "next" four times rapidly gets
/// four full announcements, in order, never a coalesced last one.
pub struct Announcer {
    rx: mpsc::UnboundedReceiver<AnnouncementJob>,
    chime: Arc<dyn ChimePlayer>,
    speech: Arc<dyn SpeechSynthesizer>,
    state_tx: watch::Sender<AnnouncerState>,
    pending: Arc<AtomicUsize>,
    /// Engine voice list, cached after the first successful fetch.
    /// A failed fetch stays `None` so the next cycle retries.
    voices: Option<Vec<VoiceCandidate>>,
}

/// Create a connected handle/worker pair
pub fn announcer_channel(
    chime: Arc<dyn ChimePlayer>,
    speech: Arc<dyn SpeechSynthesizer>,
) -> (AnnouncerHandle, Announcer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(AnnouncerState::Idle);
    let pending = Arc::new(AtomicUsize::new(0));
    let handle = AnnouncerHandle {
        tx,
        state_rx,
        pending: Arc::clone(&pending),
    };
    let announcer = Announcer {
        rx,
        chime,
        speech,
        state_tx,
        pending,
        voices: None,
    };
    (handle, announcer)
}

impl Announcer {
    /// Run the playback loop with graceful shutdown support.
    ///
    /// On shutdown the in-flight cycle finishes; jobs still queued
    /// behind it are dropped.
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        info!("Announcer started");
        loop {
            if shutdown.is_shutdown() {
                info!("Announcer shutting down");
                break;
            }
            let job = tokio::select! {
                job = self.rx.recv() => match job {
                    Some(job) => job,
                    None => {
                        info!("Announcer intake closed");
                        break;
                    }
                },
                _ = shutdown.wait() => {
                    info!("Announcer interrupted while idle");
                    break;
                }
            };
            self.announce(job).await;
        }
        let _ = self.state_tx.send(AnnouncerState::Idle);
        info!("Announcer stopped");
    }

    /// One full cycle: chime, fixed ring-out wait, speech.
    ///
    /// Every failure is contained here; the worker always comes back
    /// to Idle so later jobs are never blocked.
    async fn announce(&mut self, job: AnnouncementJob) {
        let _ = self.state_tx.send(AnnouncerState::PlayingChime);
        self.pending.fetch_sub(1, Ordering::SeqCst);
        info!(call = %job.announcement, "Announcing");

        if let Err(e) = self.chime.play().await {
            warn!("Chime playback failed: {}", e);
        }
        sleep(CHIME_WAIT).await;

        if !self.speech.is_available() {
            warn!("Speech engine unavailable, chime-only announcement");
            let _ = self.state_tx.send(AnnouncerState::Idle);
            return;
        }

        let _ = self.state_tx.send(AnnouncerState::Speaking);
        let settings = job.settings.clamped();
        let voice = self.resolve_voice(&settings.voice_id).await;
        let utterance = Utterance {
            text: job.announcement.spoken_text(),
            language: SPEECH_LANGUAGE.to_string(),
            voice,
            settings,
        };
        if let Err(e) = self.speech.speak(&utterance).await {
            warn!("Speech synthesis failed: {}", e);
        }
        let _ = self.state_tx.send(AnnouncerState::Idle);
    }

    /// Resolve the configured voice against the engine's list.
    ///
    /// The list is loaded lazily (engines populate it asynchronously)
    /// and a failed fetch is retried on the next cycle rather than
    /// cached, so a late-starting engine recovers; resolution itself
    /// re-runs on every cycle, so a changed configuration takes effect
    /// on the next announcement.
    async fn resolve_voice(&mut self, configured_id: &str) -> Option<VoiceCandidate> {
        if self.voices.is_none() {
            match self.speech.voices().await {
                Ok(list) => {
                    info!(count = list.len(), "Loaded speech engine voices");
                    self.voices = Some(list);
                }
                Err(e) => {
                    warn!("Voice list unavailable: {}", e);
                }
            }
        }
        let candidates = self.voices.as_deref().unwrap_or(&[]);
        let selected = voice::select_voice(configured_id, candidates);
        if selected.is_none() {
            warn!(
                configured = configured_id,
                "No voice resolved, engine default will speak"
            );
        }
        selected.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::chime::mocks::MockChimePlayer;
    use crate::port::speech::mocks::{MockSpeechBehavior, MockSpeechSynthesizer};
    use std::time::Duration;

    fn spawn_announcer(
        chime: Arc<MockChimePlayer>,
        speech: Arc<MockSpeechSynthesizer>,
    ) -> (AnnouncerHandle, ShutdownSender) {
        let (handle, announcer) = announcer_channel(chime, speech);
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        tokio::spawn(announcer.run(shutdown_rx));
        (handle, shutdown_tx)
    }

    fn job(prefix: char, number: u32, location: &str) -> AnnouncementJob {
        AnnouncementJob {
            announcement: Announcement::new(prefix, number, location),
            settings: AudioSettings::default(),
        }
    }

    async fn wait_idle(handle: &AnnouncerHandle) {
        loop {
            if handle.pending() == 0 && handle.state() == AnnouncerState::Idle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_submissions_run_exactly_once_each_in_order() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(MockSpeechSynthesizer::new_success());
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        for n in 1..=4 {
            assert!(handle.submit(job('A', n, "Loket Satu")));
        }
        wait_idle(&handle).await;

        assert_eq!(chime.play_count(), 4);
        let spoken = speech.spoken_texts();
        assert_eq!(spoken.len(), 4);
        for (i, text) in spoken.iter().enumerate() {
            assert!(text.contains(&format!(" {} ", i + 1)), "order broken: {}", text);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_never_overlap() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(MockSpeechSynthesizer::new(MockSpeechBehavior::Success {
            duration: Duration::from_secs(3),
        }));
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        handle.submit(job('A', 5, "Loket Satu"));
        handle.submit(job('B', 1, "Meja Customer Service"));
        wait_idle(&handle).await;

        // A's speech must be fully done before B's chime starts
        let plays = chime.play_instants();
        let spoken = speech.spoken();
        assert_eq!(plays.len(), 2);
        assert_eq!(spoken.len(), 2);
        assert!(spoken[0].text.contains(" A "));
        assert!(spoken[1].text.contains(" B "));
        assert!(plays[1] >= spoken[0].finished_at);
        // And within a cycle the chime wait separates cue from speech
        assert!(spoken[0].started_at >= plays[0] + CHIME_WAIT);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_engine_degrades_to_chime_only() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(MockSpeechSynthesizer::new_unavailable());
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        handle.submit(job('A', 1, "Loket Satu"));
        wait_idle(&handle).await;

        assert_eq!(chime.play_count(), 1);
        assert!(speech.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_block_later_jobs() {
        let chime = Arc::new(MockChimePlayer::new_fail("no device"));
        let speech = Arc::new(MockSpeechSynthesizer::new_fail("engine crashed"));
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        handle.submit(job('A', 1, "Loket Satu"));
        handle.submit(job('A', 2, "Loket Satu"));
        wait_idle(&handle).await;

        // Both cycles ran despite chime and speech both failing
        assert_eq!(chime.play_count(), 2);
        assert_eq!(handle.state(), AnnouncerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_shutdown_is_rejected() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(MockSpeechSynthesizer::new_success());
        let (handle, announcer) = announcer_channel(
            Arc::clone(&chime) as Arc<dyn ChimePlayer>,
            Arc::clone(&speech) as Arc<dyn SpeechSynthesizer>,
        );
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let worker = tokio::spawn(announcer.run(shutdown_rx));

        shutdown_tx.shutdown();
        worker.await.unwrap();

        assert!(!handle.submit(job('A', 1, "Loket Satu")));
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_voice_travels_with_the_utterance() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(
            MockSpeechSynthesizer::new_success().with_voices(vec![
                VoiceCandidate::new("id-google", "Google Bahasa Indonesia", "id-ID"),
                VoiceCandidate::new("en-1", "English Default", "en-US"),
            ]),
        );
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        handle.submit(job('A', 3, "Loket Satu"));
        wait_idle(&handle).await;

        let spoken = speech.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].voice_id.as_deref(), Some("id-google"));
    }

    #[tokio::test(start_paused = true)]
    async fn voice_list_fetch_retries_after_transient_failure() {
        let chime = Arc::new(MockChimePlayer::new_success());
        let speech = Arc::new(
            MockSpeechSynthesizer::new_success()
                .with_voices(vec![VoiceCandidate::new(
                    "id-google",
                    "Google Bahasa Indonesia",
                    "id-ID",
                )])
                .with_voice_list_failures(1),
        );
        let (handle, _shutdown) = spawn_announcer(Arc::clone(&chime), Arc::clone(&speech));

        for n in 1..=3 {
            handle.submit(job('A', n, "Loket Satu"));
        }
        wait_idle(&handle).await;

        // The first cycle rode the engine default; once the list fetch
        // succeeds, later cycles resolve the Indonesian voice again.
        let voices: Vec<_> = speech.spoken().iter().map(|r| r.voice_id.clone()).collect();
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0], None);
        assert_eq!(voices[1].as_deref(), Some("id-google"));
        assert_eq!(voices[2].as_deref(), Some("id-google"));
    }
}
