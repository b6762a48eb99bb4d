// Domain Layer - Pure business logic and entities

pub mod announcement;
pub mod audio;
pub mod error;
pub mod event;
pub mod line;
pub mod queue;
pub mod snapshot;

// Re-exports
pub use announcement::Announcement;
pub use audio::{AudioSettings, VoiceCandidate, PROSODY_RANGE};
pub use error::DomainError;
pub use event::{QueueEvent, QueueEventKind};
pub use line::ServiceLine;
pub use queue::{ticket_label, QueueNumber, QueueState};
pub use snapshot::Snapshot;
