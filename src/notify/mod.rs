// src/notify/mod.rs
mod message;
mod slack;

pub use message::AlertMessage;
pub use slack::SlackNotifier;

use crate::config::{NotifierConfig, Service};
use crate::health::CheckResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No delivery target is configured.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, result: &CheckResult, service: &Service) -> Result<Delivery, NotifyError>;
}

/// Stand-in used when no channel is configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, result: &CheckResult, service: &Service) -> Result<Delivery, NotifyError> {
        info!(
            "Slack bot token or channel not set, skipping [{}] notification for {}",
            result.status, service.name
        );
        Ok(Delivery::Skipped)
    }
}

pub fn create_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.slack_target() {
        Some((token, channel)) => Ok(Arc::new(SlackNotifier::new(config, token, channel)?)),
        None => Ok(Arc::new(DisabledNotifier)),
    }
}
