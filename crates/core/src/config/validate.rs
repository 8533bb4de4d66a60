use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde) and api_key is set for api_key auth
/// - Server port is not 0
/// - Ledger URL, contract address and private key parse
/// - Timeouts and intervals are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if matches!(config.auth.method, AuthMethod::ApiKey)
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if let Some(ledger) = &config.ledger {
        let url = url::Url::parse(&ledger.rpc_url).map_err(|e| {
            ConfigError::ValidationError(format!("ledger.rpc_url is not a valid URL: {}", e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "ledger.rpc_url must use http or https, got {}",
                url.scheme()
            )));
        }

        Address::from_str(&ledger.contract_address).map_err(|e| {
            ConfigError::ValidationError(format!(
                "ledger.contract_address is not a valid address: {}",
                e
            ))
        })?;

        if let Some(key) = &ledger.private_key {
            PrivateKeySigner::from_str(key).map_err(|_| {
                ConfigError::ValidationError(
                    "ledger.private_key is not a valid secp256k1 private key".to_string(),
                )
            })?;
        }

        if ledger.read_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "ledger.read_concurrency cannot be 0".to_string(),
            ));
        }
    }

    if config.orchestrator.confirmation_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.confirmation_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.watcher.enabled && config.watcher.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "watcher.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, AuthMethod, DeployConfig, LedgerConfig, ServerConfig,
    };
    use crate::orchestrator::{OrchestratorConfig, WatcherConfig};
    use std::net::IpAddr;

    fn base_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            ledger: None,
            orchestrator: OrchestratorConfig::default(),
            watcher: WatcherConfig::default(),
            deploy: DeployConfig::default(),
        }
    }

    fn ledger_config() -> LedgerConfig {
        LedgerConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x099cdab1370c4e8fed819e5d8c7ea7bbbf0bc170".to_string(),
            private_key: None,
            max_ticket_scan: 100,
            read_concurrency: 8,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_api_key_required() {
        let mut config = base_config();
        config.auth = AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: None,
        };
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("key".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_ledger_ok() {
        let mut config = base_config();
        config.ledger = Some(ledger_config());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_contract_address() {
        let mut config = base_config();
        let mut ledger = ledger_config();
        ledger.contract_address = "not-an-address".to_string();
        config.ledger = Some(ledger);

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("contract_address"));
    }

    #[test]
    fn test_validate_bad_rpc_url() {
        let mut config = base_config();
        let mut ledger = ledger_config();
        ledger.rpc_url = "ftp://node".to_string();
        config.ledger = Some(ledger);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_private_key() {
        let mut config = base_config();
        let mut ledger = ledger_config();
        ledger.private_key = Some("0x1234".to_string());
        config.ledger = Some(ledger);

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("private_key"));
    }

    #[test]
    fn test_validate_zero_confirmation_timeout() {
        let mut config = base_config();
        config.orchestrator.confirmation_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
