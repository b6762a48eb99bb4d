// SQLite ContentStore Implementation

use crate::queue_store::map_sqlx_error;
use async_trait::async_trait;
use loket_core::domain::AudioSettings;
use loket_core::error::{AppError, Result};
use loket_core::port::{ContentDocument, ContentStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Row mapping for the audio settings singleton
#[derive(sqlx::FromRow)]
struct AudioRow {
    voice_id: String,
    pitch: f64,
    rate: f64,
    volume: f64,
}

impl AudioRow {
    fn into_settings(self) -> AudioSettings {
        AudioSettings {
            voice_id: self.voice_id,
            pitch: self.pitch as f32,
            rate: self.rate as f32,
            volume: self.volume as f32,
        }
    }
}

/// Audio settings and the opaque content document, each a singleton
/// row seeded by the migrations.
pub struct SqliteContentStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn audio_settings(&self) -> Result<AudioSettings> {
        let row = sqlx::query_as::<_, AudioRow>(
            "SELECT voice_id, pitch, rate, volume FROM audio_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| AppError::NotFound("Audio settings not seeded".to_string()))?;
        Ok(row.into_settings())
    }

    async fn set_audio_settings(&self, settings: &AudioSettings) -> Result<()> {
        sqlx::query(
            "UPDATE audio_settings SET voice_id = ?, pitch = ?, rate = ?, volume = ? WHERE id = 1",
        )
        .bind(&settings.voice_id)
        .bind(settings.pitch as f64)
        .bind(settings.rate as f64)
        .bind(settings.volume as f64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn document(&self) -> Result<ContentDocument> {
        let raw: String = sqlx::query_scalar("SELECT document FROM content WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| AppError::NotFound("Content document not seeded".to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save_document(&self, document: &ContentDocument) -> Result<()> {
        let raw = serde_json::to_string(document)?;
        let now = self.time_provider.now_millis();
        sqlx::query("UPDATE content SET document = ?, updated_at = ? WHERE id = 1")
            .bind(&raw)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
