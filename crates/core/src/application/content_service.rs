// Content Service - snapshot assembly and admin saves

use crate::application::queue_service::QueueService;
use crate::domain::{AudioSettings, Snapshot};
use crate::error::Result;
use crate::port::ContentStore;
use std::sync::Arc;
use tracing::info;

/// Assembles and persists the content snapshot.
///
/// The snapshot's `queue` section is always read live from the store;
/// on save it is applied back only when the caller explicitly asks for
/// a restore. Everything outside `queue`/`audio` is opaque and
/// round-trips untouched.
pub struct ContentService {
    queue: Arc<QueueService>,
    content: Arc<dyn ContentStore>,
}

impl ContentService {
    pub fn new(queue: Arc<QueueService>, content: Arc<dyn ContentStore>) -> Self {
        Self { queue, content }
    }

    /// The full document as observers see it
    pub async fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            queue: self.queue.state().await?,
            audio: self.content.audio_settings().await?,
            extra: self.content.document().await?,
        })
    }

    /// Persist an admin edit and return the stored result.
    ///
    /// Counters are left alone unless `apply_queue` is set: operator
    /// queue edits travel through the atomic endpoints, so a routine
    /// save must not overwrite numbers that moved while the admin
    /// panel was open.
    pub async fn save(&self, snapshot: Snapshot, apply_queue: bool) -> Result<Snapshot> {
        let audio = snapshot.audio.clamped();
        self.content.set_audio_settings(&audio).await?;
        self.content.save_document(&snapshot.extra).await?;
        if apply_queue {
            self.queue.restore(snapshot.queue).await?;
        }
        info!(apply_queue, "Content snapshot saved");
        self.snapshot().await
    }

    pub async fn audio_settings(&self) -> Result<AudioSettings> {
        self.content.audio_settings().await
    }

    /// Clamp and persist; returns what was stored
    pub async fn set_audio_settings(&self, settings: AudioSettings) -> Result<AudioSettings> {
        let clamped = settings.clamped();
        self.content.set_audio_settings(&clamped).await?;
        info!(
            voice = %clamped.voice_id,
            pitch = clamped.pitch,
            rate = clamped.rate,
            volume = clamped.volume,
            "Audio settings updated"
        );
        Ok(clamped)
    }
}
