// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use config::{Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `HEALTH_MONITOR_STORE__API_KEY`.
pub const ENV_PREFIX: &str = "HEALTH_MONITOR";

/// Load configuration from an optional file (YAML or JSON) layered under
/// `HEALTH_MONITOR_*` environment variables.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_with_env(path.as_ref(), environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_with_env(path: &Path, env: Environment) -> Result<Config> {
    let settings = config::Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(env)
        .build()
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse config")?;

    config.validate()?;
    Ok(config)
}
