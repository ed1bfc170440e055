// src/store/memory.rs
use super::{StatusLogEntry, StatusStore, StoreError};
use crate::config::Service;
use crate::health::Status;
use crate::summary::DailySummary;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Process-local store. Backs dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    services: RwLock<Vec<Service>>,
    logs: DashMap<String, Vec<StatusLogEntry>>,
    summaries: DashMap<(String, NaiveDate), DailySummary>,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: Vec<Service>) -> Self {
        Self {
            services: RwLock::new(services),
            ..Self::default()
        }
    }

    /// Reject every write with a 503, to simulate an unavailable backend.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn logs(&self, service_id: &str) -> Vec<StatusLogEntry> {
        self.logs
            .get(service_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn summaries(&self) -> Vec<DailySummary> {
        self.summaries.iter().map(|entry| entry.value().clone()).collect()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 503,
                body: "store is read-only".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        Ok(self.services.read().await.clone())
    }

    async fn latest_status(&self, service_id: &str) -> Result<Option<Status>, StoreError> {
        Ok(self.logs.get(service_id).and_then(|entries| {
            entries
                .iter()
                .max_by_key(|entry| entry.timestamp)
                .map(|entry| entry.status)
        }))
    }

    async fn append_log(&self, entry: &StatusLogEntry) -> Result<(), StoreError> {
        self.check_writable()?;
        self.logs
            .entry(entry.service_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn daily_summary(
        &self,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, StoreError> {
        Ok(self
            .summaries
            .get(&(service_id.to_string(), date))
            .map(|summary| summary.clone()))
    }

    async fn save_summary(&self, summary: &DailySummary) -> Result<(), StoreError> {
        self.check_writable()?;
        self.summaries.insert(
            (summary.service_id.clone(), summary.date),
            summary.clone(),
        );
        Ok(())
    }
}
