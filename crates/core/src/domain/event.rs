// Queue Event Domain Model

use crate::domain::{QueueNumber, ServiceLine};
use serde::{Deserialize, Serialize};

/// What a mutation did to a line's counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueEventKind {
    /// Counter advanced by one (next customer called)
    Called,
    /// Counter moved by an operator delta or restored from a snapshot
    Adjusted,
    /// Counter set back to zero
    Reset,
    /// Current number re-announced; counter unchanged
    Recalled,
}

impl std::fmt::Display for QueueEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueEventKind::Called => write!(f, "CALLED"),
            QueueEventKind::Adjusted => write!(f, "ADJUSTED"),
            QueueEventKind::Reset => write!(f, "RESET"),
            QueueEventKind::Recalled => write!(f, "RECALLED"),
        }
    }
}

/// One entry of the ordered event feed observers follow.
///
/// `seq` is assigned by the store, strictly increasing, and written in
/// the same transaction as the mutation it describes. A committed
/// mutation therefore has exactly one event; a failed one has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub seq: i64,
    pub line: ServiceLine,
    pub kind: QueueEventKind,
    /// The line's number after the mutation (for RECALLED: unchanged)
    pub number: QueueNumber,
    pub at_ms: i64,
}
