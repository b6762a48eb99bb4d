//! Admin panel support
//!
//! A background watcher keeps the latest content snapshot warm, and an
//! edit session freezes it while an operator works on a copy. The rules
//! are the ones branch staff rely on:
//!
//! - starting an edit suspends the background refresh, so the form is
//!   not overwritten mid-edit
//! - saving pushes the draft to the daemon and then resumes refresh,
//!   the next poll reading back what the daemon stored
//! - cancelling resumes refresh without pushing anything
//!
//! Recalls and other announcement operations live on [`LoketClient`]
//! and never mutate content, so they stay usable during an edit.

use crate::client::LoketClient;
use crate::error::{Result, SdkError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How often the watcher refreshes the snapshot
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3);

/// Background snapshot refresher.
///
/// Spawns a task that polls `content.get.v1` and publishes the latest
/// document through a watch channel. While paused the task keeps
/// ticking but skips the fetch.
pub struct SnapshotWatcher {
    latest: watch::Receiver<serde_json::Value>,
    paused: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SnapshotWatcher {
    /// Start watching with the given refresh interval.
    ///
    /// The first snapshot is fetched eagerly so `latest` is populated
    /// before this returns.
    pub async fn spawn(client: LoketClient, interval: Duration) -> Result<Self> {
        let initial = client.content_get().await?.snapshot;
        let (tx, rx) = watch::channel(initial);
        let paused = Arc::new(AtomicBool::new(false));

        let task_paused = Arc::clone(&paused);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if task_paused.load(Ordering::Acquire) {
                    continue;
                }
                match client.content_get().await {
                    Ok(response) => {
                        let _ = tx.send(response.snapshot);
                    }
                    Err(_) => {
                        // Keep the last good snapshot; the next tick retries
                    }
                }
            }
        });

        Ok(Self {
            latest: rx,
            paused,
            task,
        })
    }

    /// The most recently fetched snapshot
    pub fn latest(&self) -> serde_json::Value {
        self.latest.borrow().clone()
    }

    /// Watch channel for UIs that re-render on refresh
    pub fn subscribe(&self) -> watch::Receiver<serde_json::Value> {
        self.latest.clone()
    }

    fn pause_guard(&self) -> PauseGuard {
        self.paused.store(true, Ordering::Release);
        PauseGuard {
            paused: Arc::clone(&self.paused),
        }
    }
}

impl Drop for SnapshotWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Clears the pause flag when the edit session ends, however it ends
struct PauseGuard {
    paused: Arc<AtomicBool>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.paused.store(false, Ordering::Release);
    }
}

/// Admin panel facade: a client plus a snapshot watcher.
pub struct AdminPanel {
    client: LoketClient,
    watcher: SnapshotWatcher,
}

impl AdminPanel {
    /// Connect and start the background refresh.
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::with_interval(url, DEFAULT_REFRESH_INTERVAL).await
    }

    pub async fn with_interval(url: impl AsRef<str>, interval: Duration) -> Result<Self> {
        let client = LoketClient::connect(url)?;
        let watcher = SnapshotWatcher::spawn(client.clone(), interval).await?;
        Ok(Self { client, watcher })
    }

    /// The underlying client, for queue operations alongside editing
    pub fn client(&self) -> &LoketClient {
        &self.client
    }

    /// The most recently fetched snapshot
    pub fn snapshot(&self) -> serde_json::Value {
        self.watcher.latest()
    }

    /// Watch channel for UIs that re-render on refresh
    pub fn subscribe(&self) -> watch::Receiver<serde_json::Value> {
        self.watcher.subscribe()
    }

    /// Begin editing: refresh is suspended and the operator works on a
    /// copy of the current snapshot.
    pub fn begin_edit(&self) -> AdminSession<'_> {
        AdminSession {
            client: &self.client,
            draft: self.watcher.latest(),
            _pause: self.watcher.pause_guard(),
        }
    }
}

/// One editing session over a draft snapshot.
///
/// Dropping the session without saving is a cancel: the background
/// refresh resumes and the daemon never sees the draft.
pub struct AdminSession<'a> {
    client: &'a LoketClient,
    /// The document being edited
    pub draft: serde_json::Value,
    _pause: PauseGuard,
}

impl AdminSession<'_> {
    pub fn draft_mut(&mut self) -> &mut serde_json::Value {
        &mut self.draft
    }

    /// Push the draft to the daemon, then resume background refresh.
    ///
    /// Returns the snapshot as the daemon stored it (prosody values
    /// clamped, live counters untouched unless `apply_queue` is set).
    /// On failure the session comes back with the draft intact and the
    /// refresh still suspended, so the operator can correct and retry
    /// instead of losing their work.
    pub async fn save(
        self,
        apply_queue: bool,
    ) -> std::result::Result<serde_json::Value, (Self, SdkError)> {
        match self.client.content_save(self.draft.clone(), apply_queue).await {
            Ok(saved) => Ok(saved.snapshot),
            Err(e) => Err((self, e)),
        }
    }

    /// Discard the draft and resume background refresh.
    pub fn cancel(self) {}
}
