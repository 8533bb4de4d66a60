//! HTTP surface for the ticket marketplace client.

pub mod api;
pub mod metrics;
pub mod state;
