// src/runner/report.rs
use crate::health::{CheckResult, Status};
use crate::summary::DailySummary;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    /// The policy decided this check is not stored.
    Skipped,
    Saved(DailySummary),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// No change, or the new status is OK.
    NotRequired,
    Sent,
    /// Change was notable but no channel is configured.
    Skipped,
    Failed(String),
}

impl NotificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::NotRequired => "not_required",
            NotificationOutcome::Sent => "sent",
            NotificationOutcome::Skipped => "skipped",
            NotificationOutcome::Failed(_) => "failed",
        }
    }
}

/// Everything that happened to one service during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOutcome {
    pub result: CheckResult,
    pub previous: Option<Status>,
    pub changed: bool,
    pub persistence: Persistence,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<ServiceOutcome>,
}

impl RunReport {
    pub fn checked(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, status: Status) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.status == status)
            .count()
    }

    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed).count()
    }

    pub fn persist_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.persistence, Persistence::Failed(_)))
            .count()
    }

    pub fn notifications(&self, label: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.notification.label() == label)
            .count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked ({} OK, {} WARN, {} ERROR), {} changed, {} persist failures, \
             notifications: {} sent, {} skipped, {} failed",
            self.checked(),
            self.count(Status::Ok),
            self.count(Status::Warn),
            self.count(Status::Error),
            self.changed(),
            self.persist_failures(),
            self.notifications("sent"),
            self.notifications("skipped"),
            self.notifications("failed"),
        )
    }
}
