//! Testing utilities and mock implementations.
//!
//! `MockLedger` stands in for the chain so orchestrator and API tests run
//! without a node.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ticketswap_core::orchestrator::{OrchestratorConfig, TransactionOrchestrator};
//! use ticketswap_core::testing::MockLedger;
//!
//! let ledger = Arc::new(MockLedger::new());
//! let orchestrator = TransactionOrchestrator::new(OrchestratorConfig::default(), Some(ledger.clone()));
//!
//! orchestrator.connect().await;
//! orchestrator.purchase(3).await;
//! assert_eq!(ledger.write_calls().await.len(), 1);
//! ```

mod mock_ledger;

pub use mock_ledger::{LedgerCall, MockLedger};

/// Test fixtures and helper functions.
pub mod fixtures {
    use alloy::primitives::{address, Address, U256};

    use crate::ledger::{Ticket, TicketId};

    pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");
    pub const CAROL: Address = address!("00000000000000000000000000000000000ca201");
    pub const CONTRACT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    /// Default unit price: 100000000000 wei (0.0000001 ether).
    pub fn ticket_price() -> U256 {
        U256::from(100_000_000_000u64)
    }

    /// A sold ticket at the default price.
    pub fn ticket(id: u64, owner: Address) -> Ticket {
        Ticket {
            id: TicketId(id),
            owner,
            is_available: false,
            price: ticket_price(),
        }
    }
}
