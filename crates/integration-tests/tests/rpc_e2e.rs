//! JSON-RPC End-to-End Tests
//!
//! Boots the full daemon wiring (SQLite stores, announcer worker,
//! JSON-RPC server on an ephemeral port) and drives it through the
//! SDK exactly as an operator panel or kiosk display would.

use std::sync::Arc;
use std::time::Duration;

use loket_api_rpc::{RpcServer, RpcServerConfig, ServerHandle};
use loket_core::application::announcer::{announcer_channel, shutdown_channel, ShutdownSender};
use loket_core::application::{ContentService, QueueService};
use loket_core::domain::VoiceCandidate;
use loket_core::port::chime::mocks::MockChimePlayer;
use loket_core::port::content_store::mocks::MockContentStore;
use loket_core::port::queue_store::mocks::MockQueueStore;
use loket_core::port::speech::mocks::{MockSpeechBehavior, MockSpeechSynthesizer};
use loket_core::port::time_provider::SystemTimeProvider;
use loket_core::port::{ChimePlayer, ContentStore, QueueStore, SpeechSynthesizer};
use loket_infra_sqlite::{create_pool, run_migrations, SqliteContentStore, SqliteQueueStore};
use loket_sdk::{code, AdminPanel, EventKind, LoketClient, SdkError};

struct Daemon {
    url: String,
    _server: ServerHandle,
    _shutdown: ShutdownSender,
}

/// Full daemon wiring over the given stores, bound to an ephemeral
/// port so parallel tests never collide
async fn spawn_daemon_on(
    store: Arc<dyn QueueStore>,
    content_store: Arc<dyn ContentStore>,
) -> Daemon {
    let chime: Arc<dyn ChimePlayer> = Arc::new(MockChimePlayer::new_success());
    let speech = Arc::new(
        MockSpeechSynthesizer::new(MockSpeechBehavior::Success {
            duration: Duration::from_millis(10),
        })
        .with_voices(vec![
            VoiceCandidate::new("id-id-damayanti", "Damayanti", "id-ID"),
            VoiceCandidate::new("en-us-guy", "Guy", "en-US"),
        ]),
    );

    let (handle, announcer) =
        announcer_channel(chime, Arc::clone(&speech) as Arc<dyn SpeechSynthesizer>);
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(announcer.run(shutdown_rx));

    let queue = Arc::new(QueueService::new(store, Arc::clone(&content_store), handle));
    let content = Arc::new(ContentService::new(Arc::clone(&queue), content_store));

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let server = RpcServer::new(config, queue, content, speech as Arc<dyn SpeechSynthesizer>);
    let (addr, server_handle) = server.start().await.unwrap();

    Daemon {
        url: format!("http://{}", addr),
        _server: server_handle,
        _shutdown: shutdown_tx,
    }
}

async fn spawn_daemon() -> Daemon {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let time = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteQueueStore::new(pool.clone(), time.clone()));
    let content_store = Arc::new(SqliteContentStore::new(pool, time));
    spawn_daemon_on(store, content_store).await
}

#[tokio::test]
async fn test_full_operator_flow_over_rpc() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    let status = client.status().await.unwrap();
    assert!(status.engine_available);
    assert!(!status.version.is_empty());

    let call = client.call("teller").await.unwrap();
    assert_eq!(call.number, 1);
    assert_eq!(call.ticket, "A-001");
    assert!(call.announced);

    let call = client.call("cs").await.unwrap();
    assert_eq!(call.ticket, "B-001");

    let recall = client.recall("teller").await.unwrap();
    assert_eq!(recall.number, Some(1));
    assert_eq!(recall.ticket.as_deref(), Some("A-001"));

    let adjusted = client.adjust("teller", -1).await.unwrap();
    assert_eq!(adjusted.number, 0);
    assert!(!adjusted.announced);

    let state = client.state().await.unwrap();
    assert_eq!(state.teller, 0);
    assert_eq!(state.cs, 1);

    let reset = client.reset("cs").await.unwrap();
    assert_eq!(reset.number, 0);
    let state = client.state().await.unwrap();
    assert_eq!(state.cs, 0);
    println!("✅ Operator flow over the wire: call, recall, adjust, reset");
}

#[tokio::test]
async fn test_recall_at_zero_reports_nothing_to_repeat() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    let recall = client.recall("cs").await.unwrap();
    assert_eq!(recall.number, None);
    assert_eq!(recall.ticket, None);
    assert!(!recall.announced);
    println!("✅ Recall at zero is a quiet no-op, not an error");
}

#[tokio::test]
async fn test_unknown_line_is_rejected() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    let err = client.call("security").await.unwrap_err();
    match err {
        SdkError::Rpc { code: c, message } => {
            assert_eq!(c, code::VALIDATION_ERROR);
            assert!(
                message.contains("security"),
                "the error should name the bad line: {}",
                message
            );
        }
        other => panic!("expected an RPC error, got {:?}", other),
    }
    println!("✅ An unknown service line is rejected with the validation code");
}

#[tokio::test]
async fn test_store_outage_surfaces_dedicated_code() {
    let store = Arc::new(MockQueueStore::new());
    let content_store = Arc::new(MockContentStore::new());
    let daemon = spawn_daemon_on(
        Arc::clone(&store) as Arc<dyn QueueStore>,
        content_store as Arc<dyn ContentStore>,
    )
    .await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    client.call("teller").await.unwrap();

    store.fail_writes(true);
    let err = client.call("teller").await.unwrap_err();
    assert!(err.is_store_unavailable(), "expected the store code, got {:?}", err);
    match err {
        SdkError::Rpc { code: c, .. } => assert_eq!(c, code::STORE_ERROR),
        other => panic!("expected an RPC error, got {:?}", other),
    }

    // Outage over: the counter continues where the last commit left it
    store.fail_writes(false);
    let call = client.call("teller").await.unwrap();
    assert_eq!(call.number, 2, "a failed call must not consume a number");
    println!("✅ Store outage maps to its own error code, no phantom increments");
}

#[tokio::test]
async fn test_event_feed_immediate_and_long_poll() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    client.call("teller").await.unwrap();
    client.call("teller").await.unwrap();
    client.adjust("cs", 3).await.unwrap();

    // Catch-up read returns everything at once
    let page = client.events(0, 0).await.unwrap();
    assert_eq!(page.events.len(), 3);
    assert_eq!(page.events[0].kind, EventKind::Called);
    assert_eq!(page.events[2].kind, EventKind::Adjusted);
    assert_eq!(page.latest_seq, 3);

    // Nothing new and no wait: an empty page, cursor unchanged
    let empty = client.events(page.latest_seq, 0).await.unwrap();
    assert!(empty.events.is_empty());
    assert_eq!(empty.latest_seq, 3);

    // A long poll parks until the next committed mutation
    let poller = LoketClient::connect(&daemon.url).unwrap();
    let cursor = page.latest_seq;
    let waiter = tokio::spawn(async move { poller.events(cursor, 5_000).await });

    tokio::time::sleep(Duration::from_millis(150)).await;
    client.call("cs").await.unwrap();

    let woken = waiter.await.unwrap().unwrap();
    assert_eq!(woken.events.len(), 1);
    assert_eq!(woken.events[0].kind, EventKind::Called);
    assert_eq!(woken.events[0].line, "cs");
    assert_eq!(woken.events[0].seq, 4);
    assert_eq!(woken.latest_seq, 4);
    println!("✅ Observers catch up instantly and wake on new commits");
}

#[tokio::test]
async fn test_admin_edit_session_never_clobbers_counters() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();
    let panel = AdminPanel::with_interval(&daemon.url, Duration::from_millis(200))
        .await
        .unwrap();

    client.call("teller").await.unwrap();

    let mut session = panel.begin_edit();
    session.draft_mut()["greeting"] = serde_json::json!("Selamat datang");

    // The queue keeps moving mid-edit
    client.call("teller").await.unwrap();
    client.call("teller").await.unwrap();

    let stored = session.save(false).await.map_err(|(_, e)| e).unwrap();
    assert_eq!(stored["greeting"], serde_json::json!("Selamat datang"));
    assert_eq!(
        stored["queue"]["teller"],
        serde_json::json!(3),
        "the live counter wins over the stale draft"
    );

    // After the session the background watcher resumes and converges
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(panel.snapshot()["greeting"], serde_json::json!("Selamat datang"));
    println!("✅ Edit session: branding saved, moving counters preserved");
}

#[tokio::test]
async fn test_cancelled_edit_session_pushes_nothing() {
    let daemon = spawn_daemon().await;
    let panel = AdminPanel::with_interval(&daemon.url, Duration::from_millis(200))
        .await
        .unwrap();
    let client = LoketClient::connect(&daemon.url).unwrap();

    let mut session = panel.begin_edit();
    session.draft_mut()["greeting"] = serde_json::json!("draft only");
    session.cancel();

    let doc = client.content_get().await.unwrap().snapshot;
    assert!(doc.get("greeting").is_none());
    println!("✅ Cancel discards the draft entirely");
}

#[tokio::test]
async fn test_audio_and_voice_endpoints() {
    let daemon = spawn_daemon().await;
    let client = LoketClient::connect(&daemon.url).unwrap();

    let voices = client.voices().await.unwrap();
    assert!(voices.available);
    assert_eq!(voices.voices.len(), 2);
    assert_eq!(voices.voices[0].id, "id-id-damayanti");

    let mut settings = client.audio_get().await.unwrap().settings;
    assert_eq!(settings.voice_id, "");
    settings.voice_id = "id-id-damayanti".to_string();
    settings.pitch = 5.0; // out of range, the daemon clamps
    let stored = client.audio_set(&settings).await.unwrap().settings;
    assert_eq!(stored.voice_id, "id-id-damayanti");
    assert_eq!(stored.pitch, 2.0);

    let reread = client.audio_get().await.unwrap().settings;
    assert_eq!(reread.pitch, 2.0);

    let test = client.announce_test("cs").await.unwrap();
    assert_eq!(test.line, "cs");
    assert!(test.announced);
    println!("✅ Voice listing, prosody clamping and test announcements");
}

#[tokio::test]
async fn test_many_panels_calling_concurrently() {
    let daemon = spawn_daemon().await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let url = daemon.url.clone();
        handles.push(tokio::spawn(async move {
            let client = LoketClient::connect(&url).unwrap();
            let mut numbers = Vec::new();
            for _ in 0..10 {
                numbers.push(client.call("teller").await.unwrap().number);
            }
            numbers
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        seen.extend(handle.await.unwrap());
    }
    seen.sort_unstable();
    let expected: Vec<u32> = (1..=50).collect();
    assert_eq!(seen, expected, "no duplicate and no skipped ticket numbers");
    println!("✅ Five concurrent panels, fifty unique tickets");
}
