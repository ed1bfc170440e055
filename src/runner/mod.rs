// src/runner/mod.rs
mod controller;
mod report;

pub use controller::{RunController, ServiceSource};
pub use report::{NotificationOutcome, Persistence, RunReport, ServiceOutcome};
