// Content Store Port
// Persistence for audio settings and the opaque content document

use crate::domain::AudioSettings;
use crate::error::Result;
use async_trait::async_trait;

/// Opaque top-level snapshot fields (everything except queue/audio)
pub type ContentDocument = serde_json::Map<String, serde_json::Value>;

/// Durable home of the admin-edited content.
///
/// The engine interprets only the audio settings; the rest of the
/// document is stored and returned verbatim.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn audio_settings(&self) -> Result<AudioSettings>;

    /// Persist settings (already clamped by the caller)
    async fn set_audio_settings(&self, settings: &AudioSettings) -> Result<()>;

    /// The opaque content fields as last saved (empty map initially)
    async fn document(&self) -> Result<ContentDocument>;

    /// Replace the opaque content fields wholesale
    async fn save_document(&self, document: &ContentDocument) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory content store for tests
    pub struct MockContentStore {
        audio: Arc<Mutex<AudioSettings>>,
        document: Arc<Mutex<ContentDocument>>,
    }

    impl MockContentStore {
        pub fn new() -> Self {
            Self {
                audio: Arc::new(Mutex::new(AudioSettings::default())),
                document: Arc::new(Mutex::new(ContentDocument::new())),
            }
        }

        pub fn with_audio(settings: AudioSettings) -> Self {
            let store = Self::new();
            *store.audio.lock().unwrap() = settings;
            store
        }
    }

    impl Default for MockContentStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ContentStore for MockContentStore {
        async fn audio_settings(&self) -> Result<AudioSettings> {
            Ok(self.audio.lock().unwrap().clone())
        }

        async fn set_audio_settings(&self, settings: &AudioSettings) -> Result<()> {
            *self.audio.lock().unwrap() = settings.clone();
            Ok(())
        }

        async fn document(&self) -> Result<ContentDocument> {
            Ok(self.document.lock().unwrap().clone())
        }

        async fn save_document(&self, document: &ContentDocument) -> Result<()> {
            *self.document.lock().unwrap() = document.clone();
            Ok(())
        }
    }
}
