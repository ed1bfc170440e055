// src/summary/daily.rs
use crate::health::{CheckResult, Status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate of every check for one service on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub service_id: String,
    pub date: NaiveDate,
    /// Worst status seen so far today.
    pub status: Status,
    pub ok_count: u64,
    pub warn_count: u64,
    pub error_count: u64,
    /// Mean response time over all checks counted today, in ms.
    pub avg_response_time: u64,
    pub updated_at: DateTime<Utc>,
}

impl DailySummary {
    /// First check of the day.
    pub fn start(result: &CheckResult, date: NaiveDate, now: DateTime<Utc>) -> Self {
        let mut summary = Self {
            service_id: result.service_id.clone(),
            date,
            status: result.status,
            ok_count: 0,
            warn_count: 0,
            error_count: 0,
            avg_response_time: result.response_time,
            updated_at: now,
        };
        *summary.counter_mut(result.status) = 1;
        summary
    }

    /// Fold one more check into the day.
    pub fn record(&mut self, result: &CheckResult, now: DateTime<Utc>) {
        let prev_total = self.total();
        let new_total = prev_total + 1;

        let sum = self.avg_response_time as u128 * prev_total as u128 + result.response_time as u128;
        self.avg_response_time = (sum / new_total as u128) as u64;

        *self.counter_mut(result.status) += 1;
        self.status = self.worst_status();
        self.updated_at = now;
    }

    pub fn total(&self) -> u64 {
        self.ok_count + self.warn_count + self.error_count
    }

    /// ERROR beats WARN beats OK, considering only non-zero counters.
    pub fn worst_status(&self) -> Status {
        if self.error_count > 0 {
            Status::Error
        } else if self.warn_count > 0 {
            Status::Warn
        } else {
            Status::Ok
        }
    }

    /// Share of checks that were not ERROR, in percent.
    pub fn uptime_percentage(&self) -> f64 {
        match self.total() {
            0 => 100.0,
            total => (total - self.error_count) as f64 * 100.0 / total as f64,
        }
    }

    fn counter_mut(&mut self, status: Status) -> &mut u64 {
        match status {
            Status::Ok => &mut self.ok_count,
            Status::Warn => &mut self.warn_count,
            Status::Error => &mut self.error_count,
        }
    }
}

/// Apply `result` to today's row, creating it if this is the first check.
pub fn apply_check(
    existing: Option<DailySummary>,
    result: &CheckResult,
    now: DateTime<Utc>,
) -> DailySummary {
    let today = now.date_naive();
    match existing {
        Some(mut summary) if summary.date == today => {
            summary.record(result, now);
            summary
        }
        _ => DailySummary::start(result, today, now),
    }
}
