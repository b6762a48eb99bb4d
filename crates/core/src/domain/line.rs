// Service Line Domain Model

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the two independently numbered service lines of a branch.
///
/// Each line carries its own counter, call prefix and default location
/// label; lines never share numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLine {
    Teller,
    #[serde(rename = "cs")]
    CustomerService,
}

impl ServiceLine {
    /// All lines, in display order
    pub const ALL: [ServiceLine; 2] = [ServiceLine::Teller, ServiceLine::CustomerService];

    /// Single-character label spoken and printed before the number
    pub fn prefix(&self) -> char {
        match self {
            ServiceLine::Teller => 'A',
            ServiceLine::CustomerService => 'B',
        }
    }

    /// Where the customer is directed to ("Silakan menuju ...")
    pub fn location(&self) -> &'static str {
        match self {
            ServiceLine::Teller => "Loket Satu",
            ServiceLine::CustomerService => "Meja Customer Service",
        }
    }

    /// Stable identifier used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLine::Teller => "teller",
            ServiceLine::CustomerService => "cs",
        }
    }

    /// Human-readable name for logs and tables
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceLine::Teller => "Teller",
            ServiceLine::CustomerService => "Customer Service",
        }
    }
}

impl std::fmt::Display for ServiceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceLine {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teller" => Ok(ServiceLine::Teller),
            "cs" => Ok(ServiceLine::CustomerService),
            other => Err(DomainError::UnknownLine(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_location_per_line() {
        assert_eq!(ServiceLine::Teller.prefix(), 'A');
        assert_eq!(ServiceLine::CustomerService.prefix(), 'B');
        assert_eq!(ServiceLine::Teller.location(), "Loket Satu");
        assert_eq!(ServiceLine::CustomerService.location(), "Meja Customer Service");
    }

    #[test]
    fn parse_round_trip() {
        for line in ServiceLine::ALL {
            assert_eq!(line.as_str().parse::<ServiceLine>().unwrap(), line);
        }
        assert!("loket".parse::<ServiceLine>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&ServiceLine::Teller).unwrap(), "\"teller\"");
        assert_eq!(
            serde_json::to_string(&ServiceLine::CustomerService).unwrap(),
            "\"cs\""
        );
        let line: ServiceLine = serde_json::from_str("\"cs\"").unwrap();
        assert_eq!(line, ServiceLine::CustomerService);
    }
}
