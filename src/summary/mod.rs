// src/summary/mod.rs
mod daily;

pub use daily::{apply_check, DailySummary};
