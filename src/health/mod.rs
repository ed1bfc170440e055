// src/health/mod.rs
mod classifier;
mod prober;
mod status;

pub use classifier::{classify, CheckResult, ProbeOutcome};
pub use prober::{HttpProber, Prober};
pub use status::Status;
