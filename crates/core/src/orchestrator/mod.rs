//! Transaction orchestrator.
//!
//! Translates user intents into ledger calls and folds their outcomes into the
//! session:
//! - **Validation** happens before any ledger call (addresses, ticket numbers, ownership)
//! - **Writes** are serialized and bounded by a confirmation timeout
//! - **Refresh** replaces the ticket projection after every successful write
//! - **Watcher** (optional) refreshes when contract events involve the connected account

mod config;
mod input;
mod runner;
mod types;
mod watcher;

pub use config::{OrchestratorConfig, WatcherConfig};
pub use input::{parse_address, parse_ticket_count, parse_ticket_id, SwapTarget};
pub use runner::{TransactionOrchestrator, COUNT_ERROR, OWNERSHIP_ERROR};
pub use types::{Operation, OrchestratorError, OrchestratorStatus, NO_WALLET_PROVIDER};
pub use watcher::EventWatcher;
