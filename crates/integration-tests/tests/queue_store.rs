//! Queue Store Integration Tests
//!
//! Drives the SQLite-backed store through the QueueStore port and
//! verifies the counter and event-feed guarantees end to end.

use std::sync::Arc;

use loket_core::domain::{QueueEventKind, QueueState, ServiceLine};
use loket_core::port::time_provider::mocks::MockTimeProvider;
use loket_core::port::time_provider::SystemTimeProvider;
use loket_core::port::QueueStore;
use loket_infra_sqlite::{create_pool, run_migrations, SqliteQueueStore};

async fn memory_store() -> SqliteQueueStore {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    SqliteQueueStore::new(pool, Arc::new(SystemTimeProvider))
}

fn cleanup(db_path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
    }
}

/// Every committed call hands out the next number, none skipped,
/// none repeated.
#[tokio::test]
async fn test_advance_is_strictly_increasing() {
    let store = memory_store().await;

    for expected in 1..=50u32 {
        let number = store.advance(ServiceLine::Teller).await.unwrap();
        assert_eq!(number, expected);
    }

    assert_eq!(store.current(ServiceLine::Teller).await.unwrap(), 50);
    assert_eq!(store.current(ServiceLine::CustomerService).await.unwrap(), 0);
    println!("✅ 50 sequential advances, no number skipped or repeated");
}

/// The two lines share a database but never each other's numbers
#[tokio::test]
async fn test_lines_move_independently() {
    let store = memory_store().await;

    store.advance(ServiceLine::Teller).await.unwrap();
    store.advance(ServiceLine::Teller).await.unwrap();
    store.advance(ServiceLine::Teller).await.unwrap();
    store.advance(ServiceLine::CustomerService).await.unwrap();

    assert_eq!(store.snapshot().await.unwrap(), QueueState::new(3, 1));

    store.reset(ServiceLine::Teller).await.unwrap();
    assert_eq!(store.snapshot().await.unwrap(), QueueState::new(0, 1));
    println!("✅ Teller and customer service counters are independent");
}

/// Operator deltas clamp at zero instead of going negative
#[tokio::test]
async fn test_adjust_floors_at_zero() {
    let store = memory_store().await;

    assert_eq!(store.adjust(ServiceLine::Teller, -5).await.unwrap(), 0);
    assert_eq!(store.adjust(ServiceLine::Teller, 3).await.unwrap(), 3);
    assert_eq!(store.adjust(ServiceLine::Teller, -1).await.unwrap(), 2);
    assert_eq!(store.adjust(ServiceLine::Teller, -10).await.unwrap(), 0);
    // The floor clamps the value; it does not remember the overshoot
    assert_eq!(store.adjust(ServiceLine::Teller, 1).await.unwrap(), 1);
    println!("✅ Operator deltas clamp at zero");
}

/// Recall appends to the feed but never moves the counter
#[tokio::test]
async fn test_recall_records_without_mutating() {
    let store = memory_store().await;

    // Nothing called yet: nothing to repeat, no event appended
    assert_eq!(store.record_recall(ServiceLine::Teller).await.unwrap(), None);
    assert_eq!(store.latest_seq().await.unwrap(), 0);

    store.advance(ServiceLine::Teller).await.unwrap();
    let recalled = store.record_recall(ServiceLine::Teller).await.unwrap();
    assert_eq!(recalled, Some(1));
    assert_eq!(store.current(ServiceLine::Teller).await.unwrap(), 1);

    let events = store.events_since(0, 10).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, QueueEventKind::Called);
    assert_eq!(events[1].kind, QueueEventKind::Recalled);
    assert_eq!(events[1].number, 1);
    println!("✅ Recall re-announces without touching the counter");
}

/// An absolute write (snapshot restore) lands in the feed as an
/// adjustment
#[tokio::test]
async fn test_set_overwrites_for_snapshot_restore() {
    let store = memory_store().await;
    store.advance(ServiceLine::Teller).await.unwrap();

    assert_eq!(store.set(ServiceLine::Teller, 41).await.unwrap(), 41);
    assert_eq!(store.current(ServiceLine::Teller).await.unwrap(), 41);

    let events = store.events_since(0, 10).await.unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.kind, QueueEventKind::Adjusted);
    assert_eq!(last.number, 41);
    println!("✅ Restore writes are visible in the event feed");
}

/// The feed is ordered by seq, resumable from any cursor, and pageable
#[tokio::test]
async fn test_event_feed_ordering_and_pagination() {
    let store = memory_store().await;

    store.advance(ServiceLine::Teller).await.unwrap();
    store.advance(ServiceLine::CustomerService).await.unwrap();
    store.adjust(ServiceLine::Teller, 5).await.unwrap();
    store.record_recall(ServiceLine::Teller).await.unwrap();
    store.reset(ServiceLine::CustomerService).await.unwrap();

    let all = store.events_since(0, 100).await.unwrap();
    let seqs: Vec<i64> = all.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    let kinds: Vec<QueueEventKind> = all.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            QueueEventKind::Called,
            QueueEventKind::Called,
            QueueEventKind::Adjusted,
            QueueEventKind::Recalled,
            QueueEventKind::Reset,
        ]
    );

    // A cursor resumes exactly after the given seq
    let tail = store.events_since(2, 100).await.unwrap();
    assert_eq!(tail.len(), 3);
    assert_eq!(tail.first().unwrap().seq, 3);

    // The page limit caps the batch without reordering it
    let page = store.events_since(0, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[1].seq, 2);

    assert_eq!(store.latest_seq().await.unwrap(), 5);
    println!("✅ Event feed is ordered, resumable and pageable");
}

/// Event rows carry the injected clock, so observers can show when a
/// number was called
#[tokio::test]
async fn test_events_record_the_injected_clock() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let clock = Arc::new(MockTimeProvider::new(1_000));
    let store = SqliteQueueStore::new(pool.clone(), clock.clone());

    store.advance(ServiceLine::Teller).await.unwrap();
    clock.advance(250);
    store.advance(ServiceLine::Teller).await.unwrap();

    let stamps: Vec<i64> = sqlx::query_scalar("SELECT at_ms FROM queue_events ORDER BY seq")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(stamps, vec![1_000, 1_250]);
    println!("✅ Feed entries are timestamped from the daemon clock");
}

/// Counters and the feed survive a daemon restart
#[tokio::test]
async fn test_counters_and_feed_survive_reopen() {
    let db_path = "/tmp/loket_test_persistence.db";
    cleanup(db_path);

    // Phase 1: a morning of calls, then the daemon stops
    {
        let pool = create_pool(db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteQueueStore::new(pool.clone(), Arc::new(SystemTimeProvider));

        for _ in 0..7 {
            store.advance(ServiceLine::Teller).await.unwrap();
        }
        store.advance(ServiceLine::CustomerService).await.unwrap();
        store.advance(ServiceLine::CustomerService).await.unwrap();

        pool.close().await;
    }

    // Phase 2: restart, nothing lost, sequence continues
    {
        let pool = create_pool(db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteQueueStore::new(pool.clone(), Arc::new(SystemTimeProvider));

        assert_eq!(store.snapshot().await.unwrap(), QueueState::new(7, 2));
        assert_eq!(store.latest_seq().await.unwrap(), 9);
        assert_eq!(store.advance(ServiceLine::Teller).await.unwrap(), 8);

        pool.close().await;
    }

    cleanup(db_path);
    println!("✅ Counters and event feed survive a daemon restart");
}

/// Concurrent callers on the shared pool: every number handed out
/// exactly once
#[tokio::test]
async fn test_concurrent_advance_no_lost_updates() {
    let store = Arc::new(memory_store().await);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut numbers = Vec::new();
            for _ in 0..10 {
                numbers.push(store.advance(ServiceLine::Teller).await.unwrap());
            }
            numbers
        }));
    }

    let mut all_numbers = Vec::new();
    for handle in handles {
        all_numbers.extend(handle.await.unwrap());
    }

    all_numbers.sort_unstable();
    let expected: Vec<u32> = (1..=100).collect();
    assert_eq!(all_numbers, expected, "every number handed out exactly once");
    assert_eq!(store.current(ServiceLine::Teller).await.unwrap(), 100);
    println!("✅ Concurrent advance: no lost updates, no duplicates");
}

/// Same property over a file database, where writers really contend;
/// WAL mode plus the busy timeout must absorb it without SQLITE_BUSY
#[tokio::test]
async fn test_concurrent_advance_on_file_db_no_busy_error() {
    let db_path = "/tmp/loket_test_concurrent.db";
    cleanup(db_path);

    let pool = create_pool(db_path).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = Arc::new(SqliteQueueStore::new(
        pool.clone(),
        Arc::new(SystemTimeProvider),
    ));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                store
                    .advance(ServiceLine::CustomerService)
                    .await
                    .expect("advance should not surface SQLITE_BUSY");
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.current(ServiceLine::CustomerService).await.unwrap(), 50);
    assert_eq!(store.events_since(0, 100).await.unwrap().len(), 50);

    pool.close().await;
    cleanup(db_path);
    println!("✅ File-backed pool absorbs ten concurrent writers");
}
