// Announcement Domain Model

use crate::domain::{QueueNumber, ServiceLine};
use serde::{Deserialize, Serialize};

/// One call to be spoken over the branch loudspeakers.
///
/// Created transiently per call/recall action and consumed by the
/// announcer; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub prefix: char,
    pub number: QueueNumber,
    pub location: String,
}

impl Announcement {
    pub fn new(prefix: char, number: QueueNumber, location: impl Into<String>) -> Self {
        Self {
            prefix,
            number,
            location: location.into(),
        }
    }

    /// Announcement for a line's current number, using the line's
    /// default prefix and location.
    pub fn for_line(line: ServiceLine, number: QueueNumber) -> Self {
        Self::new(line.prefix(), number, line.location())
    }

    /// The text handed to the speech engine.
    ///
    /// The ellipses are pause hints the engine renders as natural breaks.
    pub fn spoken_text(&self) -> String {
        format!(
            "Nomor Antrian... {} ... {} ... Silakan menuju ... {}",
            self.prefix, self.number, self.location
        )
    }
}

impl std::fmt::Display for Announcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:03} -> {}", self.prefix, self.number, self.location)
    }
}
