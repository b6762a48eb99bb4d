//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::{throttled_error, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AdjustRequest, AdjustResponse, AnnounceTestRequest, AnnounceTestResponse, AudioGetRequest,
    AudioResponse, AudioSetRequest, CallRequest, CallResponse, ContentGetRequest, ContentResponse,
    ContentSaveRequest, EventsRequest, EventsResponse, RecallRequest, RecallResponse, ResetRequest,
    ResetResponse, StateRequest, StateResponse, StatusRequest, StatusResponse, VoicesRequest,
    VoicesResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use loket_core::application::{ContentService, QueueService};
use loket_core::domain::{ServiceLine, Snapshot};
use loket_core::error::AppError;
use loket_core::port::SpeechSynthesizer;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Longest a queue.events.v1 request is held open, in ms.
/// Kept under common proxy idle timeouts so clients see a clean empty
/// page instead of a dropped connection.
const MAX_EVENT_WAIT_MS: u64 = 25_000;

/// Events returned per long-poll page
const EVENT_PAGE_LIMIT: u32 = 100;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    queue: Arc<QueueService>,
    content: Arc<ContentService>,
    speech: Arc<dyn SpeechSynthesizer>,
    rate_limiter: Arc<RateLimiter>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        queue: Arc<QueueService>,
        content: Arc<ContentService>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("LOKET_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("LOKET_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            queue,
            content,
            speech,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
            start_time: std::time::Instant::now(),
        }
    }

    fn parse_line(raw: &str) -> Result<ServiceLine, ErrorObjectOwned> {
        raw.parse::<ServiceLine>()
            .map_err(|e| to_rpc_error(AppError::Domain(e)))
    }

    async fn check_rate(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check().await {
            Ok(())
        } else {
            Err(throttled_error())
        }
    }

    /// queue.call.v1
    pub async fn call(&self, params: CallRequest) -> Result<CallResponse, ErrorObjectOwned> {
        self.check_rate().await?;
        let line = Self::parse_line(&params.line)?;

        let outcome = self.queue.call_next(line).await.map_err(to_rpc_error)?;

        Ok(CallResponse {
            line: line.as_str().to_string(),
            number: outcome.number,
            ticket: outcome.ticket(),
            announced: outcome.announced,
        })
    }

    /// queue.recall.v1
    pub async fn recall(&self, params: RecallRequest) -> Result<RecallResponse, ErrorObjectOwned> {
        self.check_rate().await?;
        let line = Self::parse_line(&params.line)?;

        let outcome = self.queue.recall(line).await.map_err(to_rpc_error)?;

        Ok(match outcome {
            Some(outcome) => RecallResponse {
                line: line.as_str().to_string(),
                number: Some(outcome.number),
                ticket: Some(outcome.ticket()),
                announced: outcome.announced,
            },
            None => RecallResponse {
                line: line.as_str().to_string(),
                number: None,
                ticket: None,
                announced: false,
            },
        })
    }

    /// queue.adjust.v1
    pub async fn adjust(&self, params: AdjustRequest) -> Result<AdjustResponse, ErrorObjectOwned> {
        self.check_rate().await?;
        let line = Self::parse_line(&params.line)?;

        let outcome = self
            .queue
            .adjust(line, params.delta)
            .await
            .map_err(to_rpc_error)?;

        Ok(AdjustResponse {
            line: line.as_str().to_string(),
            number: outcome.number,
            announced: outcome.announced,
        })
    }

    /// queue.reset.v1
    pub async fn reset(&self, params: ResetRequest) -> Result<ResetResponse, ErrorObjectOwned> {
        self.check_rate().await?;
        let line = Self::parse_line(&params.line)?;

        self.queue.reset(line).await.map_err(to_rpc_error)?;

        Ok(ResetResponse {
            line: line.as_str().to_string(),
            number: 0,
        })
    }

    /// queue.state.v1
    pub async fn state(&self, _params: StateRequest) -> Result<StateResponse, ErrorObjectOwned> {
        let state = self.queue.state().await.map_err(to_rpc_error)?;

        Ok(StateResponse {
            teller: state.teller,
            cs: state.cs,
        })
    }

    /// queue.events.v1
    ///
    /// Holds the request open until there is at least one event past the
    /// cursor or the wait expires. The receiver is subscribed before the
    /// first query, so a mutation landing between query and wait still
    /// wakes the poll.
    pub async fn events(&self, params: EventsRequest) -> Result<EventsResponse, ErrorObjectOwned> {
        let wait_ms = params.wait_ms.min(MAX_EVENT_WAIT_MS);
        let limit = match params.limit {
            0 => EVENT_PAGE_LIMIT,
            n => n.min(EVENT_PAGE_LIMIT),
        };
        let deadline = tokio::time::Instant::now() + Duration::from_millis(wait_ms);
        let mut changes = self.queue.subscribe_changes();

        loop {
            let events = self
                .queue
                .events_since(params.after_seq, limit)
                .await
                .map_err(to_rpc_error)?;

            if !events.is_empty() || wait_ms == 0 {
                let latest_seq = events.last().map(|e| e.seq).unwrap_or(params.after_seq);
                return Ok(EventsResponse { events, latest_seq });
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    return Ok(EventsResponse {
                        events: Vec::new(),
                        latest_seq: params.after_seq,
                    });
                }
                changed = changes.recv() => {
                    match changed {
                        Ok(()) => {}
                        // Lagged receivers re-query and catch up from the feed
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            return Ok(EventsResponse {
                                events: Vec::new(),
                                latest_seq: params.after_seq,
                            });
                        }
                    }
                }
            }
        }
    }

    /// content.get.v1
    pub async fn content_get(
        &self,
        _params: ContentGetRequest,
    ) -> Result<ContentResponse, ErrorObjectOwned> {
        let snapshot = self.content.snapshot().await.map_err(to_rpc_error)?;
        let snapshot = snapshot
            .into_value()
            .map_err(|e| to_rpc_error(AppError::Serialization(e)))?;

        Ok(ContentResponse { snapshot })
    }

    /// content.save.v1
    pub async fn content_save(
        &self,
        params: ContentSaveRequest,
    ) -> Result<ContentResponse, ErrorObjectOwned> {
        self.check_rate().await?;

        let snapshot = Snapshot::from_value(params.snapshot)
            .map_err(|e| to_rpc_error(AppError::Serialization(e)))?;

        let saved = self
            .content
            .save(snapshot, params.apply_queue)
            .await
            .map_err(to_rpc_error)?;
        let snapshot = saved
            .into_value()
            .map_err(|e| to_rpc_error(AppError::Serialization(e)))?;

        Ok(ContentResponse { snapshot })
    }

    /// audio.get.v1
    pub async fn audio_get(
        &self,
        _params: AudioGetRequest,
    ) -> Result<AudioResponse, ErrorObjectOwned> {
        let settings = self.content.audio_settings().await.map_err(to_rpc_error)?;
        Ok(AudioResponse { settings })
    }

    /// audio.set.v1
    pub async fn audio_set(
        &self,
        params: AudioSetRequest,
    ) -> Result<AudioResponse, ErrorObjectOwned> {
        self.check_rate().await?;

        let settings = self
            .content
            .set_audio_settings(params.settings)
            .await
            .map_err(to_rpc_error)?;

        Ok(AudioResponse { settings })
    }

    /// voices.list.v1
    pub async fn voices(&self, _params: VoicesRequest) -> Result<VoicesResponse, ErrorObjectOwned> {
        let voices = match self.speech.voices().await {
            Ok(voices) => voices,
            Err(e) => {
                warn!(error = %e, "Voice listing failed, returning empty list");
                Vec::new()
            }
        };

        Ok(VoicesResponse {
            voices,
            available: self.speech.is_available(),
        })
    }

    /// announce.test.v1
    pub async fn announce_test(
        &self,
        params: AnnounceTestRequest,
    ) -> Result<AnnounceTestResponse, ErrorObjectOwned> {
        self.check_rate().await?;
        let line = Self::parse_line(&params.line)?;

        let announced = self.queue.announce_test(line).await.map_err(to_rpc_error)?;

        Ok(AnnounceTestResponse {
            line: line.as_str().to_string(),
            announced,
        })
    }

    /// system.status.v1
    pub async fn status(&self, _params: StatusRequest) -> Result<StatusResponse, ErrorObjectOwned> {
        let latest_seq = self.queue.latest_seq().await.map_err(to_rpc_error)?;
        let announcer = self.queue.announcer();

        Ok(StatusResponse {
            version: loket_core::VERSION.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
            engine_available: self.speech.is_available(),
            announcer_state: announcer.state().to_string(),
            pending_announcements: announcer.pending(),
            latest_seq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loket_core::application::announcer::{announcer_channel, Announcer};
    use loket_core::port::chime::mocks::MockChimePlayer;
    use loket_core::port::content_store::mocks::MockContentStore;
    use loket_core::port::queue_store::mocks::MockQueueStore;
    use loket_core::port::speech::mocks::MockSpeechSynthesizer;

    struct Fixture {
        handler: RpcHandler,
        store: Arc<MockQueueStore>,
        // Holding the worker end keeps submissions accepted without a
        // running announcement loop
        _announcer: Announcer,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockQueueStore::new());
        let content = Arc::new(MockContentStore::new());
        let speech = Arc::new(MockSpeechSynthesizer::new_success());

        let (handle, announcer) = announcer_channel(
            Arc::new(MockChimePlayer::new_success()),
            speech.clone(),
        );
        let queue = Arc::new(QueueService::new(
            store.clone(),
            content.clone(),
            handle,
        ));
        let content_service = Arc::new(ContentService::new(queue.clone(), content));

        Fixture {
            handler: RpcHandler::new(queue, content_service, speech),
            store,
            _announcer: announcer,
        }
    }

    #[tokio::test]
    async fn test_call_reports_ticket_and_announcement() {
        let f = fixture();

        let response = f
            .handler
            .call(CallRequest {
                line: "teller".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.number, 1);
        assert_eq!(response.ticket, "A-001");
        assert!(response.announced);
    }

    #[tokio::test]
    async fn test_unknown_line_is_a_validation_error() {
        let f = fixture();

        let err = f
            .handler
            .call(CallRequest {
                line: "vip".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), crate::error::code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_recall_at_zero_returns_nothing_to_repeat() {
        let f = fixture();

        let response = f
            .handler
            .recall(RecallRequest {
                line: "cs".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.number, None);
        assert_eq!(response.ticket, None);
        assert!(!response.announced);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_store_code() {
        let f = fixture();
        f.store.fail_writes(true);

        let err = f
            .handler
            .call(CallRequest {
                line: "teller".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), crate::error::code::STORE_ERROR);
    }

    #[tokio::test]
    async fn test_events_without_wait_returns_immediately() {
        let f = fixture();

        f.handler
            .call(CallRequest {
                line: "teller".to_string(),
            })
            .await
            .unwrap();

        let page = f
            .handler
            .events(EventsRequest {
                after_seq: 0,
                wait_ms: 0,
                limit: 0,
            })
            .await
            .unwrap();

        assert_eq!(page.events.len(), 1);
        assert_eq!(page.latest_seq, page.events[0].seq);

        // Cursor past the end with no wait comes back empty
        let empty = f
            .handler
            .events(EventsRequest {
                after_seq: page.latest_seq,
                wait_ms: 0,
                limit: 0,
            })
            .await
            .unwrap();
        assert!(empty.events.is_empty());
        assert_eq!(empty.latest_seq, page.latest_seq);
    }
}
