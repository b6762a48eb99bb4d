//! Loket Daemon - Main Entry Point
//! Queue counters, announcement pipeline and the JSON-RPC surface

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use loket_api_rpc::{RpcServer, RpcServerConfig};
use loket_core::application::{announcer_channel, shutdown_channel, ContentService, QueueService};
use loket_core::port::time_provider::SystemTimeProvider;
use loket_core::port::{ChimePlayer, SpeechSynthesizer};
use loket_infra_audio::{
    CpalChimePlayer, EspeakSynthesizer, NullChimePlayer, NullSpeechSynthesizer,
};
use loket_infra_sqlite::{create_pool, run_migrations, SqliteContentStore, SqliteQueueStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.loket/loket.db";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("LOKET_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("loket=info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    // Optional daily-rolling file log; the guard must outlive main so
    // buffered lines are flushed on exit
    let (file_writer, _file_guard) = match std::env::var("LOKET_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(&dir, "loketd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Err(_) => (None, None),
    };

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            let file_layer =
                file_writer.map(|w| fmt::layer().json().with_writer(w).with_ansi(false));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .with(file_layer)
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            let file_layer =
                file_writer.map(|w| fmt::layer().json().with_writer(w).with_ansi(false));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .with(file_layer)
                .init();
        }
    }

    info!("Loket daemon v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let db_path = std::env::var("LOKET_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let rpc_port: u16 = std::env::var("LOKET_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9639);

    let muted = std::env::var("LOKET_MUTE").map(|v| v == "1").unwrap_or(false);

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup stores (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let queue_store = Arc::new(SqliteQueueStore::new(pool.clone(), time_provider.clone()));
    let content_store = Arc::new(SqliteContentStore::new(pool.clone(), time_provider.clone()));

    // 5. Setup audio adapters
    let (chime, speech): (Arc<dyn ChimePlayer>, Arc<dyn SpeechSynthesizer>) = if muted {
        info!("LOKET_MUTE=1, announcements are silent");
        (Arc::new(NullChimePlayer), Arc::new(NullSpeechSynthesizer))
    } else {
        let chime: Arc<dyn ChimePlayer> = match CpalChimePlayer::new() {
            Ok(player) => Arc::new(player),
            Err(e) => {
                warn!(error = %e, "Chime playback unavailable, continuing silent");
                Arc::new(NullChimePlayer)
            }
        };
        let speech: Arc<dyn SpeechSynthesizer> = Arc::new(EspeakSynthesizer::detect().await);
        (chime, speech)
    };

    // 6. Start the announcer loop
    info!("Starting announcer...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let (announcer_handle, announcer) = announcer_channel(chime, speech.clone());

    let announcer_task = tokio::spawn(async move {
        announcer.run(shutdown_rx).await;
    });

    // 7. Assemble application services
    let queue_service = Arc::new(QueueService::new(
        queue_store,
        content_store.clone(),
        announcer_handle,
    ));
    let content_service = Arc::new(ContentService::new(
        queue_service.clone(),
        content_store,
    ));

    // 8. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(rpc_config, queue_service, content_service, speech);
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %rpc_addr, "System ready. Waiting for calls...");
    info!("Press Ctrl+C to shutdown");

    // 9. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 10. Graceful shutdown: stop taking requests, let the announcer
    // finish the cycle it is in
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), announcer_task).await;

    info!("Shutdown complete.");

    Ok(())
}
