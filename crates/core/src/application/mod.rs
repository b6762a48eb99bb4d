// Application Layer - Use Cases and Business Logic

pub mod announcer;
pub mod content_service;
pub mod queue_service;
pub mod voice;

// Re-exports
pub use announcer::{
    announcer_channel, shutdown_channel, AnnouncementJob, Announcer, AnnouncerHandle,
    AnnouncerState, ShutdownSender, ShutdownToken,
};
pub use content_service::ContentService;
pub use queue_service::{CallOutcome, QueueService};
