//! Orchestrator and watcher configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the transaction orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound on a write, from submission until it is mined (seconds).
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Request accounts from the wallet provider when the server starts.
    #[serde(default = "default_true")]
    pub connect_on_startup: bool,
}

fn default_confirmation_timeout() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: default_confirmation_timeout(),
            connect_on_startup: true,
        }
    }
}

/// Configuration for the ledger event watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// When disabled, the projection is only refreshed after writes and on demand.
    #[serde(default)]
    pub enabled: bool,

    /// How often to poll for new contract events (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert!(config.connect_on_startup);

        let watcher = WatcherConfig::default();
        assert!(!watcher.enabled);
        assert_eq!(watcher.poll_interval_ms, 5000);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert!(config.connect_on_startup);

        let watcher: WatcherConfig = toml::from_str("enabled = true").unwrap();
        assert!(watcher.enabled);
        assert_eq!(watcher.poll_interval_ms, 5000);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            confirmation_timeout_secs = 30
            connect_on_startup = false
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.confirmation_timeout_secs, 30);
        assert!(!config.connect_on_startup);
    }
}
