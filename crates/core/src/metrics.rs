//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator operations (outcomes, durations, local rejections)
//! - Ticket projection refreshes
//! - Ledger event watcher

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Orchestrator operations total by outcome.
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketswap_operations_total",
            "Total orchestrator operations",
        ),
        &["operation", "result"], // result: "success", "environment", "validation", "ledger"
    )
    .unwrap()
});

/// Operation duration in seconds, including confirmation for writes.
pub static OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketswap_operation_duration_seconds",
            "Duration of orchestrator operations",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 15.0, 30.0, 60.0, 120.0]),
        &["operation"],
    )
    .unwrap()
});

/// Transactions sent to the ledger, by operation and outcome.
pub static TRANSACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketswap_transactions_total",
            "Total write operations that reached the ledger",
        ),
        &["operation", "result"], // result: "confirmed", "failed"
    )
    .unwrap()
});

/// Transactions that did not confirm within the configured timeout.
pub static CONFIRMATION_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketswap_confirmation_timeouts_total",
        "Total writes that timed out awaiting confirmation",
    )
    .unwrap()
});

/// Tickets bought by confirmed purchases.
pub static PURCHASED_TICKETS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketswap_purchased_tickets_total",
        "Total tickets purchased through this service",
    )
    .unwrap()
});

// =============================================================================
// Projection Metrics
// =============================================================================

/// Ticket projection refreshes by result.
pub static TICKET_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketswap_ticket_refreshes_total",
            "Total ticket projection refreshes",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Watcher Metrics
// =============================================================================

/// Contract events seen by the watcher, by event name.
pub static WATCHER_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketswap_watcher_events_total",
            "Total contract events observed by the watcher",
        ),
        &["event"],
    )
    .unwrap()
});

/// Watcher polls that failed.
pub static WATCHER_POLL_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketswap_watcher_poll_errors_total",
        "Total failed watcher polls",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(OPERATIONS_TOTAL.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(TRANSACTIONS_TOTAL.clone()),
        Box::new(CONFIRMATION_TIMEOUTS.clone()),
        Box::new(PURCHASED_TICKETS.clone()),
        // Projection
        Box::new(TICKET_REFRESHES.clone()),
        // Watcher
        Box::new(WATCHER_EVENTS.clone()),
        Box::new(WATCHER_POLL_ERRORS.clone()),
    ]
}
