// src/health/classifier.rs
use super::Status;
use crate::config::Service;
use serde::{Deserialize, Serialize};

/// What the probe transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered, whatever the status code.
    Response { elapsed_ms: u64, http_status: u16 },
    /// Connection error, timeout, DNS failure, protocol error...
    Failed { elapsed_ms: u64, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub service_id: String,
    pub status: Status,
    pub response_time: u64,
    pub http_status: Option<u16>,
    pub message: Option<String>,
}

const UNDESCRIBED_FAILURE: &str = "request failed";

/// Map a probe outcome onto OK / WARN / ERROR for `service`.
pub fn classify(service: &Service, outcome: ProbeOutcome) -> CheckResult {
    match outcome {
        ProbeOutcome::Failed { elapsed_ms, error } => {
            let message = if error.trim().is_empty() {
                UNDESCRIBED_FAILURE.to_string()
            } else {
                error
            };
            CheckResult {
                service_id: service.id.clone(),
                status: Status::Error,
                response_time: elapsed_ms,
                http_status: None,
                message: Some(message),
            }
        }
        ProbeOutcome::Response {
            elapsed_ms,
            http_status,
        } => {
            let status = if http_status >= 400 {
                Status::Error
            } else if elapsed_ms > service.threshold_ms {
                Status::Warn
            } else {
                Status::Ok
            };
            CheckResult {
                service_id: service.id.clone(),
                status,
                response_time: elapsed_ms,
                http_status: Some(http_status),
                message: None,
            }
        }
    }
}
