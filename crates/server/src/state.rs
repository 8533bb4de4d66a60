use std::sync::Arc;
use ticketswap_core::{
    Authenticator, Config, EventWatcher, SanitizedConfig, TransactionOrchestrator,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    orchestrator: Arc<TransactionOrchestrator>,
    watcher: Option<Arc<EventWatcher>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        orchestrator: Arc<TransactionOrchestrator>,
        watcher: Option<Arc<EventWatcher>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            orchestrator,
            watcher,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn orchestrator(&self) -> &TransactionOrchestrator {
        self.orchestrator.as_ref()
    }

    pub fn watcher(&self) -> Option<&EventWatcher> {
        self.watcher.as_deref()
    }
}
