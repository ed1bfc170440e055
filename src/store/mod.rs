// src/store/mod.rs
mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::config::{Service, StoreBackend, StoreConfig};
use crate::health::{CheckResult, Status};
use crate::summary::{apply_check, DailySummary};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A persisted check, as written to the status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub service_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: Status,
    pub response_time: u64,
    pub http_status: Option<u16>,
    pub message: Option<String>,
}

impl StatusLogEntry {
    pub fn new(result: &CheckResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            service_id: result.service_id.clone(),
            timestamp,
            status: result.status,
            response_time: result.response_time,
            http_status: result.http_status,
            message: result.message.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected store payload: {0}")]
    Decode(String),
}

/// Persistence boundary: services, the append-only status log and the
/// per-day summaries.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError>;

    /// Status of the most recent log entry for `service_id`, if any.
    async fn latest_status(&self, service_id: &str) -> Result<Option<Status>, StoreError>;

    async fn append_log(&self, entry: &StatusLogEntry) -> Result<(), StoreError>;

    async fn daily_summary(
        &self,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, StoreError>;

    /// Insert or replace the row keyed by (service_id, date).
    async fn save_summary(&self, summary: &DailySummary) -> Result<(), StoreError>;

    /// Read-modify-write of today's summary. Not atomic: two concurrent
    /// runs on the same service and day can lose an update.
    async fn upsert_daily_summary(
        &self,
        result: &CheckResult,
        now: DateTime<Utc>,
    ) -> Result<DailySummary, StoreError> {
        let existing = self
            .daily_summary(&result.service_id, now.date_naive())
            .await?;
        let summary = apply_check(existing, result, now);
        self.save_summary(&summary).await?;
        Ok(summary)
    }
}

/// Build the store selected by `config`.
pub fn create_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn StatusStore>> {
    match config.backend()? {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, results will not outlive this run");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Rest { url, api_key } => {
            Ok(Arc::new(RestStore::new(url, api_key, config.timeout())?))
        }
    }
}
