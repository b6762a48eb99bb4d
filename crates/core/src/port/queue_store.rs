// Queue Store Port
// Single source of truth for the two line counters and their event feed

use crate::domain::{QueueEvent, QueueNumber, QueueState, ServiceLine};
use crate::error::Result;
use async_trait::async_trait;

/// Durable, atomically mutated queue counters.
///
/// Every mutation is a single serialization point: concurrent callers
/// never observe or produce a lost update. Each committed mutation
/// appends exactly one event (same transaction); a failed mutation
/// appends none and leaves the counter untouched.
///
/// Implementations:
/// - SqliteQueueStore (infra-sqlite): production store
/// - mocks::MockQueueStore: in-memory, with failure injection
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Increment the line's counter by one and return the new value.
    ///
    /// Returned values are unique and strictly increasing per line,
    /// also under concurrent callers.
    async fn advance(&self, line: ServiceLine) -> Result<QueueNumber>;

    /// Apply `max(0, current + delta)` and return the new value
    async fn adjust(&self, line: ServiceLine, delta: i32) -> Result<QueueNumber>;

    /// Set the line's counter back to zero.
    ///
    /// Confirmation of this destructive action is the calling
    /// surface's concern, never the store's.
    async fn reset(&self, line: ServiceLine) -> Result<()>;

    /// Overwrite the counter with an absolute value (snapshot restore)
    async fn set(&self, line: ServiceLine, value: QueueNumber) -> Result<QueueNumber>;

    /// Append a RECALLED event for the line's current number and
    /// return it. Returns `None` without appending when the counter
    /// is 0 (there is nothing to re-announce). Never mutates.
    async fn record_recall(&self, line: ServiceLine) -> Result<Option<QueueNumber>>;

    /// Non-mutating read of one counter
    async fn current(&self, line: ServiceLine) -> Result<QueueNumber>;

    /// Non-mutating read of both counters
    async fn snapshot(&self) -> Result<QueueState>;

    /// Events with `seq > after_seq`, oldest first, capped at `limit`
    async fn events_since(&self, after_seq: i64, limit: u32) -> Result<Vec<QueueEvent>>;

    /// Highest assigned event seq (0 when the feed is empty)
    async fn latest_seq(&self) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::QueueEventKind;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockStoreState {
        state: QueueState,
        events: Vec<QueueEvent>,
        next_seq: i64,
    }

    /// In-memory queue store for tests.
    ///
    /// `fail_writes(true)` makes every operation return
    /// `AppError::StoreUnavailable` without touching state, for
    /// store-outage scenarios.
    pub struct MockQueueStore {
        inner: Arc<Mutex<MockStoreState>>,
        failing: Arc<AtomicBool>,
    }

    impl MockQueueStore {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(MockStoreState {
                    state: QueueState::default(),
                    events: Vec::new(),
                    next_seq: 1,
                })),
                failing: Arc::new(AtomicBool::new(false)),
            }
        }

        pub fn with_state(state: QueueState) -> Self {
            let store = Self::new();
            store.inner.lock().unwrap().state = state;
            store
        }

        /// Toggle simulated store outage
        pub fn fail_writes(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn event_count(&self) -> usize {
            self.inner.lock().unwrap().events.len()
        }

        fn check_available(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(AppError::StoreUnavailable("mock store offline".to_string()))
            } else {
                Ok(())
            }
        }

        fn append_event(
            state: &mut MockStoreState,
            line: ServiceLine,
            kind: QueueEventKind,
            number: QueueNumber,
        ) {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.events.push(QueueEvent {
                seq,
                line,
                kind,
                number,
                at_ms: seq, // deterministic stand-in timestamp
            });
        }
    }

    impl Default for MockQueueStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl QueueStore for MockQueueStore {
        async fn advance(&self, line: ServiceLine) -> Result<QueueNumber> {
            self.check_available()?;
            let mut inner = self.inner.lock().unwrap();
            let next = inner.state.get(line) + 1;
            inner.state.set(line, next);
            Self::append_event(&mut inner, line, QueueEventKind::Called, next);
            Ok(next)
        }

        async fn adjust(&self, line: ServiceLine, delta: i32) -> Result<QueueNumber> {
            self.check_available()?;
            let mut inner = self.inner.lock().unwrap();
            let current = inner.state.get(line) as i64;
            let next = (current + delta as i64).max(0) as QueueNumber;
            inner.state.set(line, next);
            Self::append_event(&mut inner, line, QueueEventKind::Adjusted, next);
            Ok(next)
        }

        async fn reset(&self, line: ServiceLine) -> Result<()> {
            self.check_available()?;
            let mut inner = self.inner.lock().unwrap();
            inner.state.set(line, 0);
            Self::append_event(&mut inner, line, QueueEventKind::Reset, 0);
            Ok(())
        }

        async fn set(&self, line: ServiceLine, value: QueueNumber) -> Result<QueueNumber> {
            self.check_available()?;
            let mut inner = self.inner.lock().unwrap();
            inner.state.set(line, value);
            Self::append_event(&mut inner, line, QueueEventKind::Adjusted, value);
            Ok(value)
        }

        async fn record_recall(&self, line: ServiceLine) -> Result<Option<QueueNumber>> {
            self.check_available()?;
            let mut inner = self.inner.lock().unwrap();
            let current = inner.state.get(line);
            if current == 0 {
                return Ok(None);
            }
            Self::append_event(&mut inner, line, QueueEventKind::Recalled, current);
            Ok(Some(current))
        }

        async fn current(&self, line: ServiceLine) -> Result<QueueNumber> {
            self.check_available()?;
            Ok(self.inner.lock().unwrap().state.get(line))
        }

        async fn snapshot(&self) -> Result<QueueState> {
            self.check_available()?;
            Ok(self.inner.lock().unwrap().state)
        }

        async fn events_since(&self, after_seq: i64, limit: u32) -> Result<Vec<QueueEvent>> {
            self.check_available()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .events
                .iter()
                .filter(|e| e.seq > after_seq)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn latest_seq(&self) -> Result<i64> {
            self.check_available()?;
            Ok(self.inner.lock().unwrap().next_seq - 1)
        }
    }
}
