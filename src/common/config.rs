//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a cluster client.
///
/// All durations are milliseconds in the serialized form so the config can be
/// written as plain TOML or passed through environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Initial cluster endpoints, e.g. `http://127.0.0.1:2379`.
    /// The real membership is fetched from the cluster after connecting.
    pub endpoints: Vec<String>,

    /// Transport errors tolerated per call before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Consecutive failures on one channel before it is evicted.
    #[serde(default = "default_failure_threshold")]
    pub channel_failure_threshold: u32,

    /// Total wait per call, across all retries and redirects.
    #[serde(default = "default_call_deadline_ms")]
    pub call_deadline_ms: u64,

    /// Timeout for establishing one channel.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// HTTP/2 keepalive ping interval. Zero disables keepalive pings.
    #[serde(default)]
    pub keepalive_interval_ms: u64,

    /// How long to wait for a keepalive ack before the channel is considered dead.
    #[serde(default = "default_keepalive_timeout_ms")]
    pub keepalive_timeout_ms: u64,

    /// Send keepalive pings even with no calls in flight.
    #[serde(default)]
    pub keepalive_while_idle: bool,
}

fn default_max_retries() -> u32 {
    5
}
fn default_failure_threshold() -> u32 {
    3
}
fn default_call_deadline_ms() -> u64 {
    10_000
}
fn default_connect_timeout_ms() -> u64 {
    3_000
}
fn default_keepalive_timeout_ms() -> u64 {
    5_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://127.0.0.1:2379".to_string()],
            max_retries: default_max_retries(),
            channel_failure_threshold: default_failure_threshold(),
            call_deadline_ms: default_call_deadline_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keepalive_interval_ms: 0,
            keepalive_timeout_ms: default_keepalive_timeout_ms(),
            keepalive_while_idle: false,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }

    pub fn call_deadline(&self) -> Duration {
        Duration::from_millis(self.call_deadline_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive_interval_ms > 0).then(|| Duration::from_millis(self.keepalive_interval_ms))
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_millis(self.keepalive_timeout_ms)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.endpoints.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "at least one endpoint is required".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(crate::Error::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.channel_failure_threshold == 0 {
            return Err(crate::Error::InvalidConfig(
                "channel_failure_threshold must be at least 1".into(),
            ));
        }
        if self.call_deadline_ms == 0 {
            return Err(crate::Error::InvalidConfig(
                "call_deadline_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from an optional TOML file, then `RXLINE_*`
    /// environment variables on top.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("RXLINE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("endpoints")
                .try_parsing(true),
        );

        let cfg: ClientConfig = builder
            .build()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?
            .try_deserialize()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
