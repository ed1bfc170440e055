// src/health/prober.rs
use super::ProbeOutcome;
use crate::config::{ProbeConfig, Service};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tokio::time::timeout;
use tracing::debug;

/// Issues a single GET against a service and reports what happened.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, service: &Service) -> ProbeOutcome;
}

pub struct HttpProber {
    config: ProbeConfig,
    client: Client,
}

impl HttpProber {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create probe HTTP client")?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, service: &Service) -> ProbeOutcome {
        let start = Instant::now();

        // reqwest enforces the timeout too; the outer one also bounds DNS
        let result = timeout(
            self.config.timeout(),
            self.client.get(service.url.as_str()).send(),
        )
        .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(response)) => {
                let http_status = response.status().as_u16();
                debug!("{} answered HTTP {} in {}ms", service.id, http_status, elapsed_ms);
                ProbeOutcome::Response {
                    elapsed_ms,
                    http_status,
                }
            }
            Ok(Err(e)) => ProbeOutcome::Failed {
                elapsed_ms,
                error: describe(&e),
            },
            Err(_) => ProbeOutcome::Failed {
                elapsed_ms,
                error: format!("Request timeout after {:?}", self.config.timeout()),
            },
        }
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        err.to_string()
    }
}
