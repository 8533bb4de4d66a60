//! One-shot TicketSale deployment.

use std::path::Path;
use std::str::FromStr;

use alloy::hex;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolValue;
use serde::Serialize;
use tracing::info;

use crate::config::DeployConfig;

use super::LedgerError;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Parameters of a deployment, resolved from [`DeployConfig`].
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub bytecode: Bytes,
    pub num_tickets: u64,
    pub ticket_price: U256,
    pub gas_limit: u64,
    pub gas_price_wei: u128,
}

impl DeployRequest {
    /// Load the artifact and parse the constructor arguments.
    pub fn from_config(config: &DeployConfig) -> Result<Self, LedgerError> {
        let ticket_price = U256::from_str(&config.ticket_price_wei).map_err(|e| {
            LedgerError::Configuration(format!(
                "deploy.ticket_price_wei is not an integer: {}",
                e
            ))
        })?;

        Ok(Self {
            bytecode: load_bytecode(&config.artifact_path)?,
            num_tickets: config.num_tickets,
            ticket_price,
            gas_limit: config.gas_limit,
            gas_price_wei: u128::from(config.gas_price_gwei) * WEI_PER_GWEI,
        })
    }

    /// Creation code: bytecode followed by the ABI-encoded
    /// `constructor(uint256 numTickets, uint256 price)` arguments.
    pub fn creation_code(&self) -> Bytes {
        let args = (U256::from(self.num_tickets), self.ticket_price).abi_encode_params();
        let mut code = Vec::with_capacity(self.bytecode.len() + args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&args);
        Bytes::from(code)
    }
}

/// A deployed contract.
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub address: Address,
    pub deployer: Address,
    pub tx_hash: B256,
}

/// Read contract bytecode from a compiler artifact.
///
/// Accepts solc/hardhat/foundry JSON (`bytecode`, `bytecode.object`,
/// `evm.bytecode.object`) or a file holding only the hex string.
pub fn load_bytecode(path: &Path) -> Result<Bytes, LedgerError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        LedgerError::Configuration(format!("cannot read artifact {}: {}", path.display(), e))
    })?;

    let hex_code = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(json) => json
            .get("bytecode")
            .and_then(|b| b.as_str().or_else(|| b.get("object").and_then(|o| o.as_str())))
            .or_else(|| json.pointer("/evm/bytecode/object").and_then(|o| o.as_str()))
            .ok_or_else(|| {
                LedgerError::Configuration(format!(
                    "artifact {} has no bytecode field",
                    path.display()
                ))
            })?
            .to_string(),
        Err(_) => raw.trim().to_string(),
    };

    let bytes = hex::decode(hex_code.trim()).map_err(|e| {
        LedgerError::Configuration(format!("artifact bytecode is not hex: {}", e))
    })?;
    if bytes.is_empty() {
        return Err(LedgerError::Configuration(
            "artifact bytecode is empty".to_string(),
        ));
    }

    Ok(Bytes::from(bytes))
}

/// Submit the creation transaction from the key's account and wait for it to be mined.
pub async fn deploy_contract(
    rpc_url: &str,
    private_key: &str,
    request: &DeployRequest,
) -> Result<Deployment, LedgerError> {
    let rpc_url = url::Url::parse(rpc_url)
        .map_err(|e| LedgerError::Configuration(format!("invalid rpc_url: {}", e)))?;
    let signer = PrivateKeySigner::from_str(private_key)
        .map_err(|_| LedgerError::Configuration("invalid private_key".to_string()))?;
    let deployer = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url);

    info!("Attempting to deploy from account {}", deployer);

    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(request.creation_code())
        .with_gas_limit(request.gas_limit)
        .with_gas_price(request.gas_price_wei);

    let pending = provider
        .send_transaction(tx)
        .await
        .map_err(|e| LedgerError::call("deploy", e))?;
    let tx_hash = *pending.tx_hash();
    info!("Deployment sent as {}, waiting for receipt", tx_hash);

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| LedgerError::call("deploy", format!("receipt unavailable: {e}")))?;

    if !receipt.status() {
        return Err(LedgerError::Reverted(tx_hash.to_string()));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        LedgerError::InvalidResponse("deployment receipt has no contract address".to_string())
    })?;

    Ok(Deployment {
        address,
        deployer,
        tx_hash,
    })
}
