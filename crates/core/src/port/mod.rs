// Port Layer - Interfaces for external dependencies

pub mod chime;
pub mod content_store;
pub mod queue_store;
pub mod speech;
pub mod time_provider;

// Re-exports
pub use chime::{ChimeError, ChimePlayer};
pub use content_store::{ContentDocument, ContentStore};
pub use queue_store::QueueStore;
pub use speech::{SpeechError, SpeechSynthesizer, Utterance};
pub use time_provider::TimeProvider;
