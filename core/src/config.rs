//! Pod client configuration.
//!
//! A `PodConfig` is usually embedded in an agent's own configuration file
//! (it derives `Deserialize`) or assembled from `POD_*` environment
//! variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on a single HTTP exchange.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retry budget for `UpdateStrategy::Conditional`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How `update_data` writes back the combined records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Read, append, then replace with no version check. Two writers that
    /// read the same content before either writes lose one write.
    #[default]
    Unconditional,
    /// Read with the `ETag`, write with `If-Match` (or `If-None-Match: *`),
    /// and redo the whole read-modify-write on 412.
    Conditional {
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodConfig {
    /// Pod root, e.g. `http://localhost:3000/agents`.
    pub pod_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub update: UpdateStrategy,
    /// Issue a HEAD before creating a container and skip the PUT if it
    /// already exists.
    #[serde(default)]
    pub probe_before_create: bool,
}

impl PodConfig {
    pub fn new(pod_url: &str) -> Self {
        Self {
            pod_url: pod_url.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            update: UpdateStrategy::default(),
            probe_before_create: false,
        }
    }

    /// Bound each exchange by `timeout`, truncated to whole seconds with a
    /// floor of one second (300ms becomes 1s, 1.9s becomes 1s). Build a
    /// `UreqTransport` directly for sub-second precision.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_update(mut self, update: UpdateStrategy) -> Self {
        self.update = update;
        self
    }

    pub fn with_probe_before_create(mut self, probe: bool) -> Self {
        self.probe_before_create = probe;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `POD_URL` (required), `POD_TIMEOUT_SECS`,
    /// `POD_UPDATE_MAX_ATTEMPTS` and `POD_PROBE_CONTAINERS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let pod_url = lookup("POD_URL").ok_or_else(|| ConfigError::MissingEnvVar {
            name: "POD_URL".to_string(),
        })?;
        let mut config = Self::new(&pod_url);

        if let Some(raw) = lookup("POD_TIMEOUT_SECS") {
            config.timeout_secs = parse_field("POD_TIMEOUT_SECS", &raw)?;
        }
        // Setting a retry budget is what opts into conditional writes.
        if let Some(raw) = lookup("POD_UPDATE_MAX_ATTEMPTS") {
            config.update = UpdateStrategy::Conditional {
                max_attempts: parse_field("POD_UPDATE_MAX_ATTEMPTS", &raw)?,
            };
        }
        if let Some(raw) = lookup("POD_PROBE_CONTAINERS") {
            config.probe_before_create = parse_field("POD_PROBE_CONTAINERS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pod_url.starts_with("http://") || self.pod_url.starts_with("https://")) {
            return Err(invalid("pod_url", "must be an absolute http(s) URL"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be at least 1"));
        }
        if let UpdateStrategy::Conditional { max_attempts: 0 } = self.update {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

fn parse_field<T>(field: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(field, &e.to_string()))
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
