//! Deploy the TicketSale contract with the `[deploy]` settings.

use std::path::PathBuf;

use alloy::primitives::utils::format_ether;
use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketswap_core::ledger::{deploy_contract, DeployRequest};
use ticketswap_core::load_config;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Deployment failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("TICKETSWAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    // ledger.contract_address may still be a placeholder, so validate_config is skipped.

    let Some(ledger) = &config.ledger else {
        bail!("A [ledger] section with rpc_url and private_key is required to deploy");
    };
    let Some(private_key) = &ledger.private_key else {
        bail!("ledger.private_key is required to sign the deployment");
    };

    let request = DeployRequest::from_config(&config.deploy)
        .with_context(|| format!("Failed to prepare {:?}", config.deploy.artifact_path))?;
    info!(
        "Deploying {:?} ({} bytes, gas limit {}, gas price {} gwei)",
        config.deploy.artifact_path,
        request.bytecode.len(),
        request.gas_limit,
        config.deploy.gas_price_gwei
    );

    let deployment = deploy_contract(&ledger.rpc_url, private_key, &request)
        .await
        .context("Contract deployment failed")?;

    println!("Contract deployed to {}", deployment.address);
    println!("Deployed from {} in {}", deployment.deployer, deployment.tx_hash);
    println!("Total tickets: {}", request.num_tickets);
    println!("Ticket price: {} ETH", format_ether(request.ticket_price));

    Ok(())
}
