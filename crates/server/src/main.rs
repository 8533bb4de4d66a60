use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketswap_core::{
    create_authenticator, load_config, validate_config, AlloyLedger, Authenticator, EventWatcher,
    TicketLedger, TransactionOrchestrator,
};
use ticketswap_server::api::create_router;
use ticketswap_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TICKETSWAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "Configuration loaded successfully (ticketswap {}, config {})",
        VERSION,
        &config_hash[..16]
    );
    info!("Auth method: {:?}", config.auth.method);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create ledger if configured; without one there is no wallet provider
    let ledger: Option<Arc<dyn TicketLedger>> = match &config.ledger {
        Some(ledger_config) => {
            let ledger = AlloyLedger::new(ledger_config).context("Failed to create ledger")?;
            info!(
                "Ledger: {} at {} (contract {})",
                ledger.name(),
                ledger_config.rpc_url,
                ledger.contract_address()
            );
            Some(Arc::new(ledger))
        }
        None => {
            warn!("No [ledger] section configured, wallet operations are unavailable");
            None
        }
    };

    let orchestrator = Arc::new(TransactionOrchestrator::new(
        config.orchestrator.clone(),
        ledger.clone(),
    ));

    if config.orchestrator.connect_on_startup && orchestrator.has_wallet_provider() {
        let status = orchestrator.connect().await;
        if status.is_error() {
            warn!("Startup connect failed: {}", status.message().unwrap_or_default());
        }
    }

    // Start the event watcher if enabled
    let watcher = match (&ledger, config.watcher.enabled) {
        (Some(ledger), true) => {
            let watcher = Arc::new(EventWatcher::new(
                config.watcher.clone(),
                Arc::clone(ledger),
                Arc::clone(&orchestrator),
            ));
            watcher.start();
            Some(watcher)
        }
        (None, true) => {
            warn!("Event watcher enabled but no ledger configured");
            None
        }
        _ => {
            info!("Event watcher disabled in config");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        orchestrator,
        watcher.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(watcher) = watcher {
        info!("Stopping event watcher...");
        watcher.stop();
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
