//! Loket Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    AdjustResponse, AnnounceTestResponse, AudioResponse, AudioSettings, CallResponse,
    ContentResponse, EventsResponse, RecallResponse, ResetResponse, StateResponse, StatusResponse,
    VoicesResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;

/// Loket Queue Daemon Client
///
/// Provides a high-level interface to the Loket daemon for operator
/// panels, kiosk displays and scripts.
///
/// # Example
///
/// ```no_run
/// use loket_sdk::LoketClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = LoketClient::connect("http://127.0.0.1:9639")?;
/// let outcome = client.call("teller").await?;
/// println!("Now serving {}", outcome.ticket);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LoketClient {
    client: HttpClient,
}

impl LoketClient {
    /// Connect to the Loket daemon.
    ///
    /// The request timeout is sized above the server's long-poll cap,
    /// so `events` calls return a page before the transport gives up.
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9639`)
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Call the next number on a line.
    ///
    /// Lines are `"teller"` and `"cs"`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use loket_sdk::LoketClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = LoketClient::connect("http://127.0.0.1:9639")?;
    /// let outcome = client.call("teller").await?;
    /// assert_eq!(outcome.line, "teller");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, line: &str) -> Result<CallResponse> {
        let mut params = ObjectParams::new();
        params.insert("line", line)?;
        Ok(self.client.request("queue.call.v1", params).await?)
    }

    /// Repeat the announcement for the line's current number.
    ///
    /// Does not advance the counter; `number` in the response is `None`
    /// when the line is still at zero.
    pub async fn recall(&self, line: &str) -> Result<RecallResponse> {
        let mut params = ObjectParams::new();
        params.insert("line", line)?;
        Ok(self.client.request("queue.recall.v1", params).await?)
    }

    /// Apply a signed correction to the line's counter.
    ///
    /// The counter never goes below zero. A positive delta announces
    /// the new number; a negative one is silent.
    pub async fn adjust(&self, line: &str, delta: i32) -> Result<AdjustResponse> {
        let mut params = ObjectParams::new();
        params.insert("line", line)?;
        params.insert("delta", delta)?;
        Ok(self.client.request("queue.adjust.v1", params).await?)
    }

    /// Reset the line's counter to zero, silently.
    pub async fn reset(&self, line: &str) -> Result<ResetResponse> {
        let mut params = ObjectParams::new();
        params.insert("line", line)?;
        Ok(self.client.request("queue.reset.v1", params).await?)
    }

    /// Read both counters.
    pub async fn state(&self) -> Result<StateResponse> {
        Ok(self.client.request("queue.state.v1", rpc_params![]).await?)
    }

    /// Long-poll the durable event feed.
    ///
    /// Returns as soon as events past `after_seq` exist, or after
    /// `wait_ms` (capped server-side) with an empty page. Feed the
    /// returned `latest_seq` back in as the next cursor.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use loket_sdk::LoketClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = LoketClient::connect("http://127.0.0.1:9639")?;
    /// let mut cursor = 0;
    /// loop {
    ///     let page = client.events(cursor, 25_000).await?;
    ///     for event in &page.events {
    ///         println!("{:?} on {}", event.kind, event.line);
    ///     }
    ///     cursor = page.latest_seq;
    /// }
    /// # }
    /// ```
    pub async fn events(&self, after_seq: i64, wait_ms: u64) -> Result<EventsResponse> {
        let mut params = ObjectParams::new();
        params.insert("after_seq", after_seq)?;
        params.insert("wait_ms", wait_ms)?;
        Ok(self.client.request("queue.events.v1", params).await?)
    }

    /// Fetch the full content snapshot.
    pub async fn content_get(&self) -> Result<ContentResponse> {
        Ok(self.client.request("content.get.v1", rpc_params![]).await?)
    }

    /// Persist an edited content snapshot.
    ///
    /// With `apply_queue` false (the normal case) the live counters are
    /// left alone and only the rest of the document is saved.
    pub async fn content_save(
        &self,
        snapshot: serde_json::Value,
        apply_queue: bool,
    ) -> Result<ContentResponse> {
        let mut params = ObjectParams::new();
        params.insert("snapshot", snapshot)?;
        params.insert("apply_queue", apply_queue)?;
        Ok(self.client.request("content.save.v1", params).await?)
    }

    /// Read the announcement audio settings.
    pub async fn audio_get(&self) -> Result<AudioResponse> {
        Ok(self.client.request("audio.get.v1", rpc_params![]).await?)
    }

    /// Replace the announcement audio settings.
    ///
    /// The daemon clamps out-of-range prosody values; the response
    /// carries what was actually stored.
    pub async fn audio_set(&self, settings: &AudioSettings) -> Result<AudioResponse> {
        let mut params = ObjectParams::new();
        params.insert("settings", settings)?;
        Ok(self.client.request("audio.set.v1", params).await?)
    }

    /// List the voices the speech engine offers.
    pub async fn voices(&self) -> Result<VoicesResponse> {
        Ok(self.client.request("voices.list.v1", rpc_params![]).await?)
    }

    /// Announce the line's current number without advancing the queue.
    pub async fn announce_test(&self, line: &str) -> Result<AnnounceTestResponse> {
        let mut params = ObjectParams::new();
        params.insert("line", line)?;
        Ok(self.client.request("announce.test.v1", params).await?)
    }

    /// Daemon health snapshot.
    pub async fn status(&self) -> Result<StatusResponse> {
        Ok(self
            .client
            .request("system.status.v1", rpc_params![])
            .await?)
    }
}
