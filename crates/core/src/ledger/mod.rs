//! Ledger abstraction.
//!
//! The `TicketLedger` trait is the only way the rest of the crate reaches the
//! chain: account access, read-only contract calls, and state-changing calls
//! that resolve once mined. `AlloyLedger` implements it over JSON-RPC.

mod alloy_ledger;
pub mod contract;
mod deploy;
mod types;

pub use alloy_ledger::AlloyLedger;
pub use deploy::{deploy_contract, load_bytecode, DeployRequest, Deployment};
pub use types::*;
