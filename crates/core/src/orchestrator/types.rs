//! Types for the transaction orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Shown when no `[ledger]` section is configured.
pub const NO_WALLET_PROVIDER: &str =
    "No wallet provider configured. Add a [ledger] section to use this app.";

/// Errors raised while running an orchestrator operation.
///
/// Operations never return these to their callers; they are folded into the
/// session status.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No wallet provider to talk to.
    #[error("{message}", message = NO_WALLET_PROVIDER)]
    NoWalletProvider,

    /// A write was attempted without a connected account.
    #[error("Please connect a wallet first.")]
    NotConnected,

    /// Input rejected before any ledger call.
    #[error("{0}")]
    Validation(String),

    /// Ledger call, submission, or confirmation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrchestratorError::Validation(message.into())
    }

    /// Metrics label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::NoWalletProvider => "environment",
            OrchestratorError::NotConnected | OrchestratorError::Validation(_) => "validation",
            OrchestratorError::Ledger(_) => "ledger",
        }
    }

    /// True when the failure happened before any ledger call.
    pub fn is_local(&self) -> bool {
        !matches!(self, OrchestratorError::Ledger(_))
    }
}

/// Orchestrator operation names, used in logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Connect,
    Purchase,
    Refund,
    Lookup,
    CreateSwapOffer,
    AcceptSwapOffer,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Purchase => "purchase",
            Operation::Refund => "refund",
            Operation::Lookup => "lookup",
            Operation::CreateSwapOffer => "create_swap_offer",
            Operation::AcceptSwapOffer => "accept_swap_offer",
        }
    }

    /// Prefix for ledger failures of this operation.
    pub(crate) fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::Connect => "Error connecting to wallet",
            Operation::Purchase => "Error purchasing ticket",
            Operation::Refund => "Error refunding ticket",
            Operation::Lookup => "Error",
            Operation::CreateSwapOffer => "Error creating swap offer",
            Operation::AcceptSwapOffer => "Error accepting swap offer",
        }
    }

    /// Whether this operation submits a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Purchase
                | Operation::Refund
                | Operation::CreateSwapOffer
                | Operation::AcceptSwapOffer
        )
    }
}

/// Orchestrator runtime status for the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether a wallet provider is configured.
    pub wallet_provider: bool,
    /// Ledger implementation name, if any.
    pub ledger: Option<String>,
    /// Whether a write is currently awaiting confirmation.
    pub write_in_flight: bool,
}
