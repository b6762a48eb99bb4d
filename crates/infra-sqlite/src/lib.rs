// Loket Infrastructure - SQLite Adapter
// Implements: QueueStore, ContentStore

mod connection;
mod content_store;
mod migration;
mod queue_store;

pub use connection::create_pool;
pub use content_store::SqliteContentStore;
pub use migration::run_migrations;
pub use queue_store::SqliteQueueStore;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
