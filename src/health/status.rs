// src/health/status.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single probe.
///
/// Variants are declared in ascending severity so the derived `Ord`
/// gives `Ok < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Error => "ERROR",
        }
    }

    /// WARN and ERROR are the statuses worth telling a human about.
    pub fn is_alerting(&self) -> bool {
        matches!(self, Status::Warn | Status::Error)
    }

    /// Numeric form used by the metrics gauge (0=OK, 1=WARN, 2=ERROR).
    pub fn severity(&self) -> i64 {
        match self {
            Status::Ok => 0,
            Status::Warn => 1,
            Status::Error => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
