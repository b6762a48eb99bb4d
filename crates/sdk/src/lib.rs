//! Loket SDK - Rust Client Library
//!
//! Provides a convenient client for the Loket queue daemon: queue
//! operations, the live event feed, and admin panel editing sessions.
//!
//! # Example
//!
//! ```no_run
//! use loket_sdk::LoketClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = LoketClient::connect("http://127.0.0.1:9639")?;
//!
//!     // Call the next customer at the teller line
//!     let outcome = client.call("teller").await?;
//!     println!("Now serving {}", outcome.ticket);
//!
//!     // Follow what happens
//!     let page = client.events(0, 5_000).await?;
//!     for event in page.events {
//!         println!("{:?} {} -> {}", event.kind, event.line, event.number);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod admin;
mod client;
mod error;
mod types;

pub use admin::{AdminPanel, AdminSession, SnapshotWatcher, DEFAULT_REFRESH_INTERVAL};
pub use client::LoketClient;
pub use error::{code, Result, SdkError};
pub use types::{
    AdjustResponse, AnnounceTestResponse, AudioResponse, AudioSettings, CallResponse,
    ContentResponse, EventKind, EventsResponse, QueueEvent, RecallResponse, ResetResponse,
    StateResponse, StatusResponse, VoiceInfo, VoicesResponse,
};
