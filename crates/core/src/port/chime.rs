// Chime Player Port
// The fixed two-tone cue played before every spoken announcement

use async_trait::async_trait;
use thiserror::Error;

/// Chime playback errors
#[derive(Error, Debug)]
pub enum ChimeError {
    #[error("No audio output device: {0}")]
    DeviceUnavailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Starts the two-tone cue on the output device.
///
/// `play` returns once playback has begun; the announcer holds its own
/// fixed wait for the cue to ring out, so implementations never block
/// for the full chime duration.
///
/// Implementations:
/// - CpalChimePlayer (infra-audio): real device output
/// - NullChimePlayer (infra-audio): silent, for muted daemons
/// - mocks::MockChimePlayer: records play instants
#[async_trait]
pub trait ChimePlayer: Send + Sync {
    async fn play(&self) -> Result<(), ChimeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Mock chime behavior
    #[derive(Debug, Clone)]
    pub enum MockChimeBehavior {
        /// Playback starts immediately
        Success,
        /// Playback fails with a device error
        Fail(String),
    }

    /// Mock chime player recording when each cue started.
    ///
    /// Instants use tokio time, so tests under `start_paused` get
    /// deterministic orderings.
    pub struct MockChimePlayer {
        behavior: Arc<Mutex<MockChimeBehavior>>,
        plays: Arc<Mutex<Vec<Instant>>>,
    }

    impl MockChimePlayer {
        pub fn new(behavior: MockChimeBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                plays: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockChimeBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockChimeBehavior::Fail(message.into()))
        }

        pub fn play_count(&self) -> usize {
            self.plays.lock().unwrap().len()
        }

        pub fn play_instants(&self) -> Vec<Instant> {
            self.plays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChimePlayer for MockChimePlayer {
        async fn play(&self) -> Result<(), ChimeError> {
            self.plays.lock().unwrap().push(Instant::now());
            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockChimeBehavior::Success => Ok(()),
                MockChimeBehavior::Fail(msg) => Err(ChimeError::DeviceUnavailable(msg)),
            }
        }
    }
}
