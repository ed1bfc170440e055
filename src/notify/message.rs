// src/notify/message.rs
use crate::config::Service;
use crate::health::{CheckResult, Status};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{json, Value};

/// Channel-independent content of a status notification.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub status: Status,
    pub title: String,
    pub url: String,
    pub http_status: String,
    pub response_time: String,
    pub message: String,
    pub issued_at: String,
}

impl AlertMessage {
    pub fn render(
        result: &CheckResult,
        service: &Service,
        now: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            status: result.status,
            title: format!("[{}] {}", result.status, service.name),
            url: service.url.to_string(),
            http_status: result
                .http_status
                .map(|code| code.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            response_time: format!("{}ms", result.response_time),
            message: result
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            issued_at: format_timestamp(now, utc_offset_minutes),
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self.status {
            Status::Error => ":red_circle:",
            Status::Warn => ":large_yellow_circle:",
            Status::Ok => ":large_green_circle:",
        }
    }

    /// Slack Block Kit payload for `chat.postMessage`.
    pub fn to_slack_payload(&self, channel: &str) -> Value {
        json!({
            "channel": channel,
            "text": self.title,
            "blocks": [
                {
                    "type": "header",
                    "text": {
                        "type": "plain_text",
                        "text": format!("{} {}", self.emoji(), self.title),
                        "emoji": true
                    }
                },
                {
                    "type": "section",
                    "fields": [
                        {"type": "mrkdwn", "text": format!("*URL:*\n{}", self.url)},
                        {"type": "mrkdwn", "text": format!("*HTTP Status:*\n{}", self.http_status)},
                        {"type": "mrkdwn", "text": format!("*Response Time:*\n{}", self.response_time)},
                        {"type": "mrkdwn", "text": format!("*Message:*\n{}", self.message)}
                    ]
                },
                {
                    "type": "context",
                    "elements": [
                        {"type": "mrkdwn", "text": format!(":clock1: {}", self.issued_at)}
                    ]
                }
            ]
        })
    }
}

fn format_timestamp(now: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    match FixedOffset::east_opt(utc_offset_minutes * 60) {
        Some(offset) => now
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string(),
        None => now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}
