//! Ledger event watcher.
//!
//! Polls the contract for events in newly mined blocks and refreshes the
//! ticket projection when one of them involves the connected account.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::ledger::{LedgerError, TicketLedger};
use crate::metrics;

use super::config::WatcherConfig;
use super::runner::TransactionOrchestrator;

/// Background poller for contract events.
pub struct EventWatcher {
    config: WatcherConfig,
    ledger: Arc<dyn TicketLedger>,
    orchestrator: Arc<TransactionOrchestrator>,

    // Runtime state
    running: Arc<AtomicBool>,
    // Last block already scanned; `None` until the first poll.
    cursor: Arc<Mutex<Option<u64>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EventWatcher {
    pub fn new(
        config: WatcherConfig,
        ledger: Arc<dyn TicketLedger>,
        orchestrator: Arc<TransactionOrchestrator>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            ledger,
            orchestrator,
            running: Arc::new(AtomicBool::new(false)),
            cursor: Arc::new(Mutex::new(None)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start polling (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Event watcher already running");
            return;
        }

        info!(
            "Starting event watcher (poll every {}ms)",
            self.config.poll_interval_ms
        );

        let running = Arc::clone(&self.running);
        let ledger = Arc::clone(&self.ledger);
        let orchestrator = Arc::clone(&self.orchestrator);
        let cursor = Arc::clone(&self.cursor);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Event watcher loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Event watcher received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = Self::poll(&ledger, &orchestrator, &cursor).await {
                            metrics::WATCHER_POLL_ERRORS.inc();
                            warn!("Event watcher poll failed: {}", e);
                        }
                    }
                }
            }
            info!("Event watcher loop stopped");
        });
    }

    /// Stop polling.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Event watcher not running");
            return;
        }

        info!("Stopping event watcher");
        let _ = self.shutdown_tx.send(());
    }

    /// Run a single poll. Returns the number of events seen.
    pub async fn poll_once(&self) -> Result<usize, LedgerError> {
        Self::poll(&self.ledger, &self.orchestrator, &self.cursor).await
    }

    async fn poll(
        ledger: &Arc<dyn TicketLedger>,
        orchestrator: &TransactionOrchestrator,
        cursor: &Mutex<Option<u64>>,
    ) -> Result<usize, LedgerError> {
        let mut cursor = cursor.lock().await;
        let latest = ledger.latest_block().await?;

        // The first poll only sets the starting point.
        let Some(last_seen) = *cursor else {
            debug!("Event watcher starting at block {}", latest);
            *cursor = Some(latest);
            return Ok(0);
        };

        if latest <= last_seen {
            return Ok(0);
        }

        let events = ledger.events(last_seen + 1, latest).await?;
        *cursor = Some(latest);

        let account = orchestrator.connected_account().await;
        let mut affects_account = false;
        for event in &events {
            metrics::WATCHER_EVENTS
                .with_label_values(&[event.name()])
                .inc();
            debug!("Observed {:?}", event);
            if account.is_some_and(|a| event.involves(a)) {
                affects_account = true;
            }
        }

        if let (true, Some(account)) = (affects_account, account) {
            info!(
                "Contract events in blocks {}..={} involve {}, refreshing tickets",
                last_seen + 1,
                latest,
                account
            );
            orchestrator.refresh_tickets(account).await;
        }

        Ok(events.len())
    }
}
