// SQLite QueueStore Implementation

use async_trait::async_trait;
use loket_core::domain::{QueueEvent, QueueEventKind, QueueNumber, QueueState, ServiceLine};
use loket_core::error::{AppError, Result};
use loket_core::port::{QueueStore, TimeProvider};
use sqlx::{SqlitePool, Transaction};
use std::sync::Arc;

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // Extract database-specific error code and message
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::StoreUnavailable(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "275" => AppError::StoreUnavailable(format!(
                        "Check constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::StoreUnavailable(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => {
                        AppError::StoreUnavailable(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::StoreUnavailable(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::StoreUnavailable(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::StoreUnavailable("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::StoreUnavailable(format!("Column not found: {}", col))
        }
        _ => AppError::StoreUnavailable(err.to_string()),
    }
}

/// Row mapping for the event feed
#[derive(sqlx::FromRow)]
struct EventRow {
    seq: i64,
    line: String,
    kind: String,
    number: i64,
    at_ms: i64,
}

impl EventRow {
    fn into_event(self) -> Result<QueueEvent> {
        let line: ServiceLine = self
            .line
            .parse()
            .map_err(|_| AppError::Internal(format!("Corrupt event line: {}", self.line)))?;
        let kind = match self.kind.as_str() {
            "CALLED" => QueueEventKind::Called,
            "ADJUSTED" => QueueEventKind::Adjusted,
            "RESET" => QueueEventKind::Reset,
            "RECALLED" => QueueEventKind::Recalled,
            other => {
                return Err(AppError::Internal(format!("Corrupt event kind: {}", other)));
            }
        };
        Ok(QueueEvent {
            seq: self.seq,
            line,
            kind,
            number: self.number as QueueNumber,
            at_ms: self.at_ms,
        })
    }
}

/// Durable queue counters backed by SQLite.
///
/// Each mutation is one transaction: the counter update and its event
/// row commit together or not at all. The increment itself happens in
/// SQL (`current = current + 1 ... RETURNING`), so concurrent callers
/// serialize inside the database and can never pop the same number.
pub struct SqliteQueueStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    async fn append_event(
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        line: ServiceLine,
        kind: QueueEventKind,
        number: QueueNumber,
        at_ms: i64,
    ) -> Result<i64> {
        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO queue_events (line, kind, number, at_ms) VALUES (?, ?, ?, ?) RETURNING seq",
        )
        .bind(line.as_str())
        .bind(kind.to_string())
        .bind(number as i64)
        .bind(at_ms)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(seq)
    }

    /// Run one counter mutation plus its event atomically
    async fn mutate(
        &self,
        line: ServiceLine,
        kind: QueueEventKind,
        update_sql: &str,
        bind_value: i64,
    ) -> Result<QueueNumber> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let number: i64 = sqlx::query_scalar(update_sql)
            .bind(bind_value)
            .bind(now)
            .bind(line.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| AppError::NotFound(format!("Queue line not seeded: {}", line)))?;

        let number = number as QueueNumber;
        Self::append_event(&mut tx, line, kind, number, now).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(number)
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn advance(&self, line: ServiceLine) -> Result<QueueNumber> {
        self.mutate(
            line,
            QueueEventKind::Called,
            "UPDATE queue_lines SET current = current + ?, updated_at = ? \
             WHERE line = ? RETURNING current",
            1,
        )
        .await
    }

    async fn adjust(&self, line: ServiceLine, delta: i32) -> Result<QueueNumber> {
        self.mutate(
            line,
            QueueEventKind::Adjusted,
            "UPDATE queue_lines SET current = MAX(0, current + ?), updated_at = ? \
             WHERE line = ? RETURNING current",
            delta as i64,
        )
        .await
    }

    async fn reset(&self, line: ServiceLine) -> Result<()> {
        self.mutate(
            line,
            QueueEventKind::Reset,
            "UPDATE queue_lines SET current = MAX(0, ?), updated_at = ? \
             WHERE line = ? RETURNING current",
            0,
        )
        .await?;
        Ok(())
    }

    async fn set(&self, line: ServiceLine, value: QueueNumber) -> Result<QueueNumber> {
        self.mutate(
            line,
            QueueEventKind::Adjusted,
            "UPDATE queue_lines SET current = MAX(0, ?), updated_at = ? \
             WHERE line = ? RETURNING current",
            value as i64,
        )
        .await
    }

    async fn record_recall(&self, line: ServiceLine) -> Result<Option<QueueNumber>> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let current: i64 = sqlx::query_scalar("SELECT current FROM queue_lines WHERE line = ?")
            .bind(line.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| AppError::NotFound(format!("Queue line not seeded: {}", line)))?;

        if current == 0 {
            return Ok(None);
        }

        let number = current as QueueNumber;
        Self::append_event(&mut tx, line, QueueEventKind::Recalled, number, now).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(number))
    }

    async fn current(&self, line: ServiceLine) -> Result<QueueNumber> {
        let current: i64 = sqlx::query_scalar("SELECT current FROM queue_lines WHERE line = ?")
            .bind(line.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| AppError::NotFound(format!("Queue line not seeded: {}", line)))?;
        Ok(current as QueueNumber)
    }

    async fn snapshot(&self) -> Result<QueueState> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT line, current FROM queue_lines")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let mut state = QueueState::default();
        for (line, current) in rows {
            if let Ok(line) = line.parse::<ServiceLine>() {
                state.set(line, current as QueueNumber);
            }
        }
        Ok(state)
    }

    async fn events_since(&self, after_seq: i64, limit: u32) -> Result<Vec<QueueEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT seq, line, kind, number, at_ms FROM queue_events \
             WHERE seq > ? ORDER BY seq ASC LIMIT ?",
        )
        .bind(after_seq)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn latest_seq(&self) -> Result<i64> {
        let seq: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(seq), 0) FROM queue_events")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(seq)
    }
}
