// src/metrics/collector.rs
use crate::health::CheckResult;
use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::path::Path;
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }

    /// Write metrics for the node-exporter textfile collector, via a temp
    /// file renamed into place.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let buffer = self.gather()?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, buffer)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
        Ok(())
    }
}

pub struct MetricsCollector {
    pub checks_total: IntCounterVec,
    pub check_response_time_ms: IntGaugeVec,
    pub service_status: IntGaugeVec,
    pub persist_failures_total: IntCounter,
    pub notifications_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let checks_total = IntCounterVec::new(
            Opts::new("health_monitor_checks_total", "Checks performed by status"),
            &["status"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        let check_response_time_ms = IntGaugeVec::new(
            Opts::new(
                "health_monitor_check_response_time_ms",
                "Response time of the last check",
            ),
            &["service"],
        )?;
        registry.register(Box::new(check_response_time_ms.clone()))?;

        let service_status = IntGaugeVec::new(
            Opts::new(
                "health_monitor_status",
                "Status of the last check (0=OK, 1=WARN, 2=ERROR)",
            ),
            &["service"],
        )?;
        registry.register(Box::new(service_status.clone()))?;

        let persist_failures_total = IntCounter::new(
            "health_monitor_persist_failures_total",
            "Check results that could not be stored",
        )?;
        registry.register(Box::new(persist_failures_total.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new(
                "health_monitor_notifications_total",
                "Notification attempts by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            checks_total,
            check_response_time_ms,
            service_status,
            persist_failures_total,
            notifications_total,
        })
    }

    pub fn record_check(&self, result: &CheckResult) {
        self.checks_total
            .with_label_values(&[result.status.as_str()])
            .inc();
        self.check_response_time_ms
            .with_label_values(&[result.service_id.as_str()])
            .set(result.response_time as i64);
        self.service_status
            .with_label_values(&[result.service_id.as_str()])
            .set(result.status.severity());
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures_total.inc();
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications_total.with_label_values(&[outcome]).inc();
    }
}
