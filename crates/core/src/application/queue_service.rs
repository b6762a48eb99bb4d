// Queue Service - call/recall/adjust/reset use cases

use crate::application::announcer::{AnnouncementJob, AnnouncerHandle};
use crate::domain::{
    ticket_label, Announcement, AudioSettings, QueueEvent, QueueNumber, QueueState, ServiceLine,
};
use crate::error::Result;
use crate::port::{ContentStore, QueueStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the change-notification channel. Receivers that lag
/// re-query the durable feed, so lost notifications only cost latency.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Result of a queue operation as reported to the calling surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub line: ServiceLine,
    pub number: QueueNumber,
    /// Whether an announcement job was queued for this operation
    pub announced: bool,
}

impl CallOutcome {
    pub fn ticket(&self) -> String {
        ticket_label(self.line, self.number)
    }
}

/// Mutating and reading facade over the queue counters.
///
/// Every mutation goes through the store's serialization point; only
/// committed mutations notify observers or reach the announcer, so a
/// failed write can never be heard or displayed.
pub struct QueueService {
    store: Arc<dyn QueueStore>,
    content: Arc<dyn ContentStore>,
    announcer: AnnouncerHandle,
    changes_tx: broadcast::Sender<()>,
}

impl QueueService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        content: Arc<dyn ContentStore>,
        announcer: AnnouncerHandle,
    ) -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store,
            content,
            announcer,
            changes_tx,
        }
    }

    /// Advance the line and announce the new number
    pub async fn call_next(&self, line: ServiceLine) -> Result<CallOutcome> {
        let number = self.store.advance(line).await?;
        self.notify_changed();
        info!(line = %line, number, "Called next number");
        let announced = self.submit_announcement(Announcement::for_line(line, number)).await;
        Ok(CallOutcome {
            line,
            number,
            announced,
        })
    }

    /// Re-announce the current number without touching the counter.
    ///
    /// Returns `None` when the counter is 0: nobody has been called
    /// yet, so there is nothing to repeat.
    pub async fn recall(&self, line: ServiceLine) -> Result<Option<CallOutcome>> {
        let number = match self.store.record_recall(line).await? {
            Some(number) => number,
            None => {
                info!(line = %line, "Recall skipped, queue at zero");
                return Ok(None);
            }
        };
        self.notify_changed();
        info!(line = %line, number, "Recalling current number");
        let announced = self.submit_announcement(Announcement::for_line(line, number)).await;
        Ok(Some(CallOutcome {
            line,
            number,
            announced,
        }))
    }

    /// Apply an operator delta (floored at 0).
    ///
    /// Only a positive delta is announced: bumping the queue forward
    /// calls a customer, correcting it backward is silent bookkeeping.
    pub async fn adjust(&self, line: ServiceLine, delta: i32) -> Result<CallOutcome> {
        let number = self.store.adjust(line, delta).await?;
        self.notify_changed();
        info!(line = %line, delta, number, "Adjusted queue line");
        let announced = if delta > 0 {
            self.submit_announcement(Announcement::for_line(line, number)).await
        } else {
            false
        };
        Ok(CallOutcome {
            line,
            number,
            announced,
        })
    }

    /// Set the line back to zero, silently.
    ///
    /// Confirmation of this destructive action belongs to the calling
    /// surface; by the time this runs the operator has already agreed.
    pub async fn reset(&self, line: ServiceLine) -> Result<()> {
        self.store.reset(line).await?;
        self.notify_changed();
        info!(line = %line, "Queue line reset");
        Ok(())
    }

    /// Overwrite both counters from a restored snapshot
    pub async fn restore(&self, state: QueueState) -> Result<QueueState> {
        for line in ServiceLine::ALL {
            self.store.set(line, state.get(line)).await?;
        }
        self.notify_changed();
        info!(teller = state.teller, cs = state.cs, "Queue counters restored");
        self.store.snapshot().await
    }

    /// Speak the line's current number so the admin can audition the
    /// configured voice. Counter untouched, nothing recorded.
    pub async fn announce_test(&self, line: ServiceLine) -> Result<bool> {
        let number = self.store.current(line).await?;
        info!(line = %line, number, "Test announcement requested");
        Ok(self.submit_announcement(Announcement::for_line(line, number)).await)
    }

    pub async fn current(&self, line: ServiceLine) -> Result<QueueNumber> {
        self.store.current(line).await
    }

    pub async fn state(&self) -> Result<QueueState> {
        self.store.snapshot().await
    }

    pub async fn events_since(&self, after_seq: i64, limit: u32) -> Result<Vec<QueueEvent>> {
        self.store.events_since(after_seq, limit).await
    }

    pub async fn latest_seq(&self) -> Result<i64> {
        self.store.latest_seq().await
    }

    /// Wakeup channel: fires after every committed mutation. Carries
    /// no payload; subscribers re-query `events_since` for the ordered,
    /// durable feed.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes_tx.subscribe()
    }

    /// Announcer phase and backlog, for status reporting
    pub fn announcer(&self) -> &AnnouncerHandle {
        &self.announcer
    }

    fn notify_changed(&self) {
        let _ = self.changes_tx.send(());
    }

    /// Queue one announcement, with the prosody settings sampled now
    async fn submit_announcement(&self, announcement: Announcement) -> bool {
        let settings = match self.content.audio_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Audio settings unavailable, announcing with defaults: {}", e);
                AudioSettings::default()
            }
        };
        let accepted = self.announcer.submit(AnnouncementJob {
            announcement,
            settings,
        });
        if !accepted {
            warn!("Announcer stopped, call will not be spoken");
        }
        accepted
    }
}
