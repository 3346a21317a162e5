//! Warden configuration

use anyhow::Result;
use serde::Deserialize;

/// Warden configuration, fixed at startup and never reloaded
#[derive(Debug, Clone, Deserialize)]
pub struct WardenConfig {
    /// Namespace holding the managed workload group
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Label selector matching the managed pods
    #[serde(default = "default_label_selector")]
    pub label_selector: String,

    /// Path of the restart sentinel file inside each pod
    #[serde(default = "default_sentinel_path")]
    pub sentinel_path: String,

    /// Maximum fraction of the fleet allowed to restart concurrently
    #[serde(default = "default_max_restart_fraction")]
    pub max_restart_fraction: f64,

    /// Server-side watch timeout in seconds
    #[serde(default = "default_watch_timeout")]
    pub watch_timeout_secs: u32,

    /// Fixed delay in seconds before reconnecting a failed watch
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_label_selector() -> String {
    "restart-warden/managed=true".to_string()
}

fn default_sentinel_path() -> String {
    "/var/run/restart-allowed".to_string()
}

fn default_max_restart_fraction() -> f64 {
    0.25
}

fn default_watch_timeout() -> u32 {
    60
}

fn default_reconnect_backoff() -> u64 {
    10
}

fn default_api_port() -> u16 {
    8080
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            label_selector: default_label_selector(),
            sentinel_path: default_sentinel_path(),
            max_restart_fraction: default_max_restart_fraction(),
            watch_timeout_secs: default_watch_timeout(),
            reconnect_backoff_secs: default_reconnect_backoff(),
            api_port: default_api_port(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from the environment (prefix `WARDEN_`)
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("WARDEN"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Reject configurations the admission policy cannot operate under
    pub fn validate(&self) -> Result<()> {
        if !(self.max_restart_fraction > 0.0 && self.max_restart_fraction <= 1.0) {
            anyhow::bail!(
                "max_restart_fraction must be in (0, 1], got {}",
                self.max_restart_fraction
            );
        }
        if self.label_selector.trim().is_empty() {
            anyhow::bail!("label_selector must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.max_restart_fraction, 0.25);
        assert_eq!(config.watch_timeout_secs, 60);
        assert_eq!(config.reconnect_backoff_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let mut config = WardenConfig::default();
        config.max_restart_fraction = 0.0;
        assert!(config.validate().is_err());

        config.max_restart_fraction = 1.5;
        assert!(config.validate().is_err());

        config.max_restart_fraction = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_selector() {
        let mut config = WardenConfig::default();
        config.label_selector = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
