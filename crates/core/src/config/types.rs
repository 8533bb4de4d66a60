use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::{OrchestratorConfig, WatcherConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Wallet provider and contract binding. Absent means no wallet provider.
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Ledger (JSON-RPC node + TicketSale contract) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:8545")
    pub rpc_url: String,
    /// Deployed TicketSale contract address
    pub contract_address: String,
    /// Hex private key used to sign locally. When unset, the node's managed
    /// accounts (`eth_accounts`) sign instead.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Upper bound on ticket ids scanned when projecting an account's tickets
    #[serde(default = "default_max_ticket_scan")]
    pub max_ticket_scan: u64,
    /// Concurrent `tickets(id)` reads while projecting
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
}

fn default_max_ticket_scan() -> u64 {
    10_000
}

fn default_read_concurrency() -> usize {
    8
}

/// Contract deployment configuration (used by `ticketswap-deploy`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
    /// Compiled contract artifact: JSON with a `bytecode` field, or a raw hex file
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Constructor argument `numTickets`
    #[serde(default = "default_num_tickets")]
    pub num_tickets: u64,
    /// Constructor argument `price`, in wei (decimal string)
    #[serde(default = "default_ticket_price_wei")]
    pub ticket_price_wei: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            num_tickets: default_num_tickets(),
            ticket_price_wei: default_ticket_price_wei(),
            gas_limit: default_gas_limit(),
            gas_price_gwei: default_gas_price_gwei(),
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("TicketSale.json")
}

fn default_num_tickets() -> u64 {
    100
}

fn default_ticket_price_wei() -> String {
    // 0.0000001 ETH
    "100000000000".to_string()
}

fn default_gas_limit() -> u64 {
    3_000_000
}

fn default_gas_price_gwei() -> u64 {
    20
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<SanitizedLedgerConfig>,
    pub orchestrator: OrchestratorConfig,
    pub watcher: WatcherConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

/// Sanitized ledger config (private key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// "local_key" or "node_accounts"
    pub signer: String,
    pub max_ticket_scan: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
            },
            server: config.server.clone(),
            ledger: config.ledger.as_ref().map(|l| SanitizedLedgerConfig {
                rpc_url: l.rpc_url.clone(),
                contract_address: l.contract_address.clone(),
                signer: if l.private_key.is_some() {
                    "local_key".to_string()
                } else {
                    "node_accounts".to_string()
                },
                max_ticket_scan: l.max_ticket_scan,
            }),
            orchestrator: config.orchestrator.clone(),
            watcher: config.watcher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
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

    #[test]
    fn test_deserialize_valid_config_with_none_auth() {
        let toml = r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.auth.method, AuthMethod::None));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let toml = r#"
[auth]
method = "none"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.ledger.is_none());
        assert_eq!(config.orchestrator.confirmation_timeout_secs, 120);
        assert!(!config.watcher.enabled);
        assert_eq!(config.deploy.num_tickets, 100);
        assert_eq!(config.deploy.ticket_price_wei, "100000000000");
        assert_eq!(config.deploy.gas_limit, 3_000_000);
        assert_eq!(config.deploy.gas_price_gwei, 20);
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_ledger_section() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "secret"

[ledger]
rpc_url = "https://sepolia.example.org"
contract_address = "0x099cdab1370c4e8fed819e5d8c7ea7bbbf0bc170"
private_key = "0xdeadbeef"
max_ticket_scan = 500
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.auth.method, AuthMethod::ApiKey));
        assert_eq!(config.auth.api_key.as_deref(), Some("secret"));

        let ledger = config.ledger.as_ref().unwrap();
        assert_eq!(ledger.rpc_url, "https://sepolia.example.org");
        assert_eq!(ledger.private_key.as_deref(), Some("0xdeadbeef"));
        assert_eq!(ledger.max_ticket_scan, 500);
        assert_eq!(ledger.read_concurrency, 8); // default
    }

    #[test]
    fn test_sanitized_config() {
        let config = minimal_config();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "none");
        assert_eq!(sanitized.server.port, 8080);
        assert!(sanitized.ledger.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_private_key() {
        let mut config = minimal_config();
        config.ledger = Some(LedgerConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x099cdab1370c4e8fed819e5d8c7ea7bbbf0bc170".to_string(),
            private_key: Some("0xsupersecret".to_string()),
            max_ticket_scan: 100,
            read_concurrency: 4,
        });

        let sanitized = SanitizedConfig::from(&config);
        let ledger = sanitized.ledger.as_ref().unwrap();
        assert_eq!(ledger.signer, "local_key");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("supersecret"));
    }
}
