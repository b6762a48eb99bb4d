// Cpal chime player
// Plays the fixed two-tone cue on the default output device

use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use loket_core::application::announcer::constants::{
    CHIME_ATTACK_SECS, CHIME_FIRST_TONE_HZ, CHIME_FIRST_TONE_SECS, CHIME_PEAK_AMPLITUDE,
    CHIME_SECOND_TONE_HZ, CHIME_SECOND_TONE_OFFSET_SECS, CHIME_SECOND_TONE_SECS,
    CHIME_TAIL_AMPLITUDE,
};
use loket_core::port::{ChimeError, ChimePlayer};

/// Commands sent to the playback thread.
enum ChimeCommand {
    Play {
        reply: oneshot::Sender<Result<(), ChimeError>>,
    },
    Shutdown,
}

/// Read cursor into the rendered cue, shared with the stream callback.
///
/// The callback emits samples from `pos` onward and silence once the
/// buffer is exhausted. Restarting playback is just `pos = 0`.
struct Playhead {
    samples: Arc<Vec<f32>>,
    pos: usize,
}

impl Playhead {
    fn next_sample(&mut self) -> f32 {
        let sample = self.samples.get(self.pos).copied().unwrap_or(0.0);
        if self.pos < self.samples.len() {
            self.pos += 1;
        }
        sample
    }
}

/// Render the complete two-tone cue at the given device rate.
///
/// Each tone ramps linearly to peak over the attack window, then decays
/// exponentially to near silence across its remaining duration. The second
/// tone starts while the first is still ringing, so the regions overlap
/// and are summed.
pub(crate) fn render_chime(sample_rate: u32) -> Vec<f32> {
    let total_secs = CHIME_SECOND_TONE_OFFSET_SECS + CHIME_SECOND_TONE_SECS;
    let len = (total_secs * sample_rate as f32).ceil() as usize;
    let mut samples = vec![0.0f32; len];

    mix_tone(
        &mut samples,
        sample_rate,
        CHIME_FIRST_TONE_HZ,
        0.0,
        CHIME_FIRST_TONE_SECS,
    );
    mix_tone(
        &mut samples,
        sample_rate,
        CHIME_SECOND_TONE_HZ,
        CHIME_SECOND_TONE_OFFSET_SECS,
        CHIME_SECOND_TONE_SECS,
    );

    samples
}

fn mix_tone(samples: &mut [f32], sample_rate: u32, freq: f32, offset_secs: f32, duration_secs: f32) {
    let rate = sample_rate as f32;
    let start = (offset_secs * rate) as usize;
    let count = (duration_secs * rate) as usize;
    let attack = ((CHIME_ATTACK_SECS * rate) as usize).max(1);
    let decay = (count - attack).max(1) as f32;
    let decay_ratio = CHIME_TAIL_AMPLITUDE / CHIME_PEAK_AMPLITUDE;

    for i in 0..count {
        let Some(slot) = samples.get_mut(start + i) else {
            break;
        };
        let envelope = if i < attack {
            CHIME_PEAK_AMPLITUDE * (i as f32 / attack as f32)
        } else {
            CHIME_PEAK_AMPLITUDE * decay_ratio.powf((i - attack) as f32 / decay)
        };
        let t = i as f32 / rate;
        *slot += envelope * (2.0 * PI * freq * t).sin();
    }
}

/// Stream construction helpers.
mod playback {
    use super::*;

    pub fn get_device() -> Result<Device, ChimeError> {
        cpal::default_host()
            .default_output_device()
            .ok_or_else(|| ChimeError::DeviceUnavailable("No default output device".to_string()))
    }

    pub fn build_stream(
        device: &Device,
        playhead: Arc<Mutex<Playhead>>,
    ) -> Result<Stream, ChimeError> {
        let supported = device.default_output_config().map_err(|e| {
            ChimeError::DeviceUnavailable(format!("Failed to get default config: {}", e))
        })?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;

        debug!(
            sample_rate = config.sample_rate.0,
            channels,
            format = ?sample_format,
            "Opening chime output stream"
        );

        let err_fn = |err| warn!(%err, "Chime stream error");

        let stream = match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, channels, &playhead, |s| s);
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, channels, &playhead, |s| {
                        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                    });
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_output_stream(
                &config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, channels, &playhead, |s| {
                        ((s.clamp(-1.0, 1.0) * 0.5 + 0.5) * u16::MAX as f32) as u16
                    });
                },
                err_fn,
                None,
            ),
            other => {
                return Err(ChimeError::DeviceUnavailable(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        }
        .map_err(|e| ChimeError::DeviceUnavailable(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ChimeError::PlaybackFailed(format!("Failed to start stream: {}", e)))?;

        Ok(stream)
    }

    fn fill_frames<T: Copy>(
        data: &mut [T],
        channels: usize,
        playhead: &Arc<Mutex<Playhead>>,
        convert: impl Fn(f32) -> T,
    ) {
        let mut playhead = match playhead.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = convert(playhead.next_sample());
            for slot in frame {
                *slot = sample;
            }
        }
    }

    pub fn device_sample_rate(device: &Device) -> Result<u32, ChimeError> {
        let supported = device.default_output_config().map_err(|e| {
            ChimeError::DeviceUnavailable(format!("Failed to get default config: {}", e))
        })?;
        Ok(supported.sample_rate().0)
    }
}

/// Playback thread runner - creates the Stream on this thread.
///
/// The stream stays open after the first successful play and renders
/// silence between cues, so repeated announcements do not pay device
/// open latency.
fn chime_thread_main(mut cmd_rx: mpsc::Receiver<ChimeCommand>) {
    // Stream is kept here on the playback thread (not Send)
    let mut stream: Option<Stream> = None;
    let mut playhead: Option<Arc<Mutex<Playhead>>> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            ChimeCommand::Play { reply } => {
                let result = (|| -> Result<(), ChimeError> {
                    if stream.is_none() {
                        let device = playback::get_device()?;
                        let rate = playback::device_sample_rate(&device)?;
                        let head = Arc::new(Mutex::new(Playhead {
                            samples: Arc::new(render_chime(rate)),
                            pos: usize::MAX,
                        }));
                        stream = Some(playback::build_stream(&device, Arc::clone(&head))?);
                        playhead = Some(head);
                        info!(sample_rate = rate, "Chime output stream opened");
                    }

                    let head = playhead
                        .as_ref()
                        .ok_or_else(|| ChimeError::PlaybackFailed("No playhead".to_string()))?;
                    match head.lock() {
                        Ok(mut guard) => guard.pos = 0,
                        Err(poisoned) => poisoned.into_inner().pos = 0,
                    }
                    Ok(())
                })();

                // A failed open leaves no stream behind, so the next play retries
                if result.is_err() {
                    stream = None;
                    playhead = None;
                }
                let _ = reply.send(result);
            }
            ChimeCommand::Shutdown => {
                break;
            }
        }
    }
    debug!("Chime playback thread shutting down");
}

/// Cpal-backed chime player.
///
/// Uses a dedicated playback thread to handle the non-Send Stream type.
/// The device is opened lazily on first play, so constructing the player
/// on a headless machine succeeds; the failure surfaces per cue and the
/// announcer degrades that cycle instead of crashing the daemon.
pub struct CpalChimePlayer {
    cmd_tx: mpsc::Sender<ChimeCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpalChimePlayer {
    pub fn new() -> Result<Self, ChimeError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let thread_handle = thread::Builder::new()
            .name("chime-playback".to_string())
            .spawn(move || chime_thread_main(cmd_rx))
            .map_err(|e| {
                ChimeError::DeviceUnavailable(format!("Failed to spawn playback thread: {}", e))
            })?;

        Ok(Self {
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }
}

impl Drop for CpalChimePlayer {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(ChimeCommand::Shutdown);
        if let Ok(mut guard) = self.thread_handle.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

#[async_trait]
impl ChimePlayer for CpalChimePlayer {
    async fn play(&self) -> Result<(), ChimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.cmd_tx
            .send(ChimeCommand::Play { reply: reply_tx })
            .await
            .map_err(|_| ChimeError::PlaybackFailed("Playback thread stopped".to_string()))?;

        reply_rx
            .await
            .map_err(|_| ChimeError::PlaybackFailed("Playback thread stopped".to_string()))?
    }
}

// ============================================================================
// Tests
// ============================================================================
