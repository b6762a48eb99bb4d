//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server the operator surfaces talk to.

use crate::handler::RpcHandler;
use crate::types::{
    AdjustRequest, AnnounceTestRequest, AudioGetRequest, AudioSetRequest, CallRequest,
    ContentGetRequest, ContentSaveRequest, EventsRequest, RecallRequest, ResetRequest,
    StateRequest, StatusRequest, VoicesRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use loket_core::application::{ContentService, QueueService};
use loket_core::port::SpeechSynthesizer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// Localhost only: the daemon serves the branch machine it runs on.
// Kiosk displays and operator panels connect over loopback.
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9639;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        queue: Arc<QueueService>,
        content: Arc<ContentService>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(queue, content, speech)),
        }
    }

    /// Start the JSON-RPC server.
    ///
    /// Returns the bound address alongside the handle; with port 0 the
    /// caller can discover the kernel-assigned port.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method("queue.call.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CallRequest = params.parse()?;
                    handler.call(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.recall.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RecallRequest = params.parse()?;
                    handler.recall(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.adjust.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AdjustRequest = params.parse()?;
                    handler.adjust(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.reset.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ResetRequest = params.parse()?;
                    handler.reset(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.state.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.state(StateRequest {}).await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.events.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: EventsRequest = params.parse()?;
                    handler.events(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("content.get.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.content_get(ContentGetRequest {}).await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("content.save.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ContentSaveRequest = params.parse()?;
                    handler.content_save(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("audio.get.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.audio_get(AudioGetRequest {}).await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("audio.set.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AudioSetRequest = params.parse()?;
                    handler.audio_set(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("voices.list.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.voices(VoicesRequest {}).await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("announce.test.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AnnounceTestRequest = params.parse()?;
                    handler.announce_test(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("system.status.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.status(StatusRequest {}).await }
            })
            .map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
