// Queue Domain Model

use crate::domain::ServiceLine;
use serde::{Deserialize, Serialize};

/// Current number of a queue line (non-negative, no upper bound)
pub type QueueNumber = u32;

/// The pair of counters all observers converge on.
///
/// Both fields are >= 0 by construction. The durable store owns the
/// authoritative copy; everything else holds read-only snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    #[serde(default)]
    pub teller: QueueNumber,
    #[serde(default)]
    pub cs: QueueNumber,
}

impl QueueState {
    pub fn new(teller: QueueNumber, cs: QueueNumber) -> Self {
        Self { teller, cs }
    }

    pub fn get(&self, line: ServiceLine) -> QueueNumber {
        match line {
            ServiceLine::Teller => self.teller,
            ServiceLine::CustomerService => self.cs,
        }
    }

    pub fn set(&mut self, line: ServiceLine, value: QueueNumber) {
        match line {
            ServiceLine::Teller => self.teller = value,
            ServiceLine::CustomerService => self.cs = value,
        }
    }
}

/// Display form of a call, e.g. `A-007`
pub fn ticket_label(line: ServiceLine, number: QueueNumber) -> String {
    format!("{}-{:03}", line.prefix(), number)
}
