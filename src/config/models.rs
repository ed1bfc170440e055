// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Scheme that selects the in-process store instead of PostgREST.
pub const MEMORY_STORE_URL: &str = "memory://";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub probe: ProbeConfig,
    pub notifier: NotifierConfig,
    pub metrics: MetricsConfig,
    pub persistence_policy: PersistencePolicy,
    /// Static service list; when empty the list is read from the store.
    pub services: Vec<Service>,
}

/// A monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub url: Url,
    pub threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Which store implementation a config resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Rest { url: Url, api_key: String },
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backend(&self) -> Result<StoreBackend, ConfigError> {
        let url = match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return Err(ConfigError::MissingCredential("store.url")),
        };

        if url == MEMORY_STORE_URL {
            return Ok(StoreBackend::Memory);
        }

        let api_key = match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ConfigError::MissingCredential("store.api_key")),
        };

        let url = Url::parse(url).map_err(|e| ConfigError::Invalid {
            field: "store.url",
            reason: e.to_string(),
        })?;

        Ok(StoreBackend::Rest { url, api_key })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("health-monitor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub slack_bot_token: Option<String>,
    pub slack_channel_id: Option<String>,
    pub api_base: String,
    /// Offset applied to the issue timestamp in messages.
    pub utc_offset_minutes: i32,
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            slack_bot_token: None,
            slack_channel_id: None,
            api_base: "https://slack.com/api".to_string(),
            utc_offset_minutes: 0,
            timeout_secs: 10,
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Token and channel, when both are set to something non-blank.
    pub fn slack_target(&self) -> Option<(&str, &str)> {
        let token = self.slack_bot_token.as_deref().map(str::trim)?;
        let channel = self.slack_channel_id.as_deref().map(str::trim)?;
        if token.is_empty() || channel.is_empty() {
            return None;
        }
        Some((token, channel))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub textfile_path: Option<PathBuf>,
}

/// When check results reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistencePolicy {
    /// Every check is logged and counted in the daily summary.
    #[default]
    AlwaysLog,
    /// Only checks whose status differs from the previous one are stored.
    ChangeGated,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    MissingCredential(&'static str),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("duplicate service id `{0}`")]
    DuplicateService(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.backend()?;

        if self.store.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "store.timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "probe.timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.notifier.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "notifier.timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.id.as_str()) {
                return Err(ConfigError::DuplicateService(service.id.clone()));
            }
            if !matches!(service.url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    field: "services.url",
                    reason: format!("{} is not an http(s) URL", service.url),
                });
            }
        }

        Ok(())
    }
}
