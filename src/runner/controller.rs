// src/runner/controller.rs
use super::{NotificationOutcome, Persistence, RunReport, ServiceOutcome};
use crate::config::{PersistencePolicy, Service};
use crate::health::{classify, CheckResult, Prober};
use crate::metrics::MetricsCollector;
use crate::notify::{Delivery, Notifier};
use crate::store::{StatusLogEntry, StatusStore, StoreError};
use crate::summary::DailySummary;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Where the list of services to check comes from.
#[derive(Debug, Clone)]
pub enum ServiceSource {
    Store,
    Static(Vec<Service>),
}

/// Drives one sequential pass over every configured service.
pub struct RunController {
    store: Arc<dyn StatusStore>,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    policy: PersistencePolicy,
    source: ServiceSource,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RunController {
    pub fn new(
        store: Arc<dyn StatusStore>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            prober,
            notifier,
            policy: PersistencePolicy::default(),
            source: ServiceSource::Store,
            metrics: None,
        }
    }

    pub fn with_policy(mut self, policy: PersistencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_source(mut self, source: ServiceSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Check every service once. Only failing to load the service list is
    /// an error; per-service failures end up in the report.
    pub async fn run(&self) -> Result<RunReport, StoreError> {
        let run_id = Uuid::new_v4();
        self.run_inner()
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_inner(&self) -> Result<RunReport, StoreError> {
        info!("Starting health check...");

        let services = match &self.source {
            ServiceSource::Store => self.store.list_services().await?,
            ServiceSource::Static(services) => services.clone(),
        };

        let mut report = RunReport::default();
        if services.is_empty() {
            info!("No services found");
            return Ok(report);
        }

        info!("Checking {} services...", services.len());

        for service in &services {
            let outcome = self
                .check_service(service)
                .instrument(info_span!("check", service = %service.id))
                .await;
            report.outcomes.push(outcome);
        }

        info!("Health check completed: {}", report);
        Ok(report)
    }

    pub async fn check_service(&self, service: &Service) -> ServiceOutcome {
        let outcome = self.prober.probe(service).await;
        let result = classify(service, outcome);
        let now = Utc::now();

        let previous = match self.store.latest_status(&service.id).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Could not read previous status of {}: {}", service.name, e);
                None
            }
        };
        let changed = previous != Some(result.status);

        info!("{}", check_line(service, &result, changed));

        if let Some(metrics) = &self.metrics {
            metrics.record_check(&result);
        }

        let persistence = if self.should_persist(changed) {
            self.persist(&result, now).await
        } else {
            Persistence::Skipped
        };

        let notification = if changed && result.status.is_alerting() {
            self.notify(&result, service).await
        } else {
            NotificationOutcome::NotRequired
        };

        if let Some(metrics) = &self.metrics {
            if matches!(persistence, Persistence::Failed(_)) {
                metrics.record_persist_failure();
            }
            if notification != NotificationOutcome::NotRequired {
                metrics.record_notification(notification.label());
            }
        }

        ServiceOutcome {
            result,
            previous,
            changed,
            persistence,
            notification,
        }
    }

    fn should_persist(&self, changed: bool) -> bool {
        match self.policy {
            PersistencePolicy::AlwaysLog => true,
            PersistencePolicy::ChangeGated => changed,
        }
    }

    async fn persist(&self, result: &CheckResult, now: DateTime<Utc>) -> Persistence {
        let entry = StatusLogEntry::new(result, now);
        if let Err(e) = self.store.append_log(&entry).await {
            error!("  -> Failed to save to database: {}", e);
            return Persistence::Failed(e.to_string());
        }

        match self.store.upsert_daily_summary(result, now).await {
            Ok(summary) => {
                info!("  -> Status saved to database ({})", day_line(&summary));
                Persistence::Saved(summary)
            }
            Err(e) => {
                error!("  -> Failed to update daily summary: {}", e);
                Persistence::Failed(e.to_string())
            }
        }
    }

    async fn notify(&self, result: &CheckResult, service: &Service) -> NotificationOutcome {
        match self.notifier.notify(result, service).await {
            Ok(Delivery::Sent) => NotificationOutcome::Sent,
            Ok(Delivery::Skipped) => NotificationOutcome::Skipped,
            Err(e) => {
                error!("Error sending notification for {}: {}", service.name, e);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}

/// `[STATUS] name: Nms (HTTP code|N/A) changed=bool`
fn check_line(service: &Service, result: &CheckResult, changed: bool) -> String {
    let http = result
        .http_status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "[{}] {}: {}ms (HTTP {}) changed={}",
        result.status, service.name, result.response_time, http, changed
    )
}

fn day_line(summary: &DailySummary) -> String {
    format!(
        "today: {}, {} checks, {:.1}% up",
        summary.status,
        summary.total(),
        summary.uptime_percentage()
    )
}
