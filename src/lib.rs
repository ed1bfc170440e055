// src/lib.rs
pub mod config;
pub mod health;
pub mod metrics;
pub mod notify;
pub mod runner;
pub mod store;
pub mod summary;
