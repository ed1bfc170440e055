// src/notify/slack.rs
use super::{AlertMessage, Delivery, Notifier, NotifyError};
use crate::config::{NotifierConfig, Service};
use crate::health::CheckResult;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Posts messages through the Slack Web API (`chat.postMessage`).
pub struct SlackNotifier {
    client: Client,
    endpoint: String,
    token: String,
    channel: String,
    utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(config: &NotifierConfig, token: &str, channel: &str) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat.postMessage", config.api_base.trim_end_matches('/')),
            token: token.to_string(),
            channel: channel.to_string(),
            utc_offset_minutes: config.utc_offset_minutes,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, result: &CheckResult, service: &Service) -> Result<Delivery, NotifyError> {
        let alert = AlertMessage::render(result, service, Utc::now(), self.utc_offset_minutes);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&alert.to_slack_payload(&self.channel))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("HTTP {}", status)));
        }

        let body: SlackResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Rejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        info!("Slack notification sent for {}", service.name);
        Ok(Delivery::Sent)
    }
}
