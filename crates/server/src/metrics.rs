//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ticketswap server:
//! - HTTP request metrics (latency, counts, auth failures)
//! - Session state (collected dynamically)
//! - Orchestrator and watcher counters registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketswap_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketswap_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketswap_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Session Metrics (collected dynamically)
// =============================================================================

/// Whether a wallet account is connected (1) or not (0).
pub static SESSION_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_session_connected",
        "Whether a wallet account is connected (1) or not (0)",
    )
    .unwrap()
});

/// Tickets in the connected account's projection.
pub static SESSION_TICKETS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_session_tickets",
        "Tickets owned by the connected account, as of the last refresh",
    )
    .unwrap()
});

/// Whether a swap offer from this session is pending.
pub static SWAP_OFFER_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_swap_offer_pending",
        "Whether a swap offer created by this session awaits an accept attempt",
    )
    .unwrap()
});

/// Whether a write is awaiting confirmation.
pub static WRITE_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_write_in_flight",
        "Whether a transaction is currently awaiting confirmation",
    )
    .unwrap()
});

/// Event watcher running state (1 = running, 0 = stopped).
pub static WATCHER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketswap_watcher_running",
        "Whether the ledger event watcher is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Session
    registry
        .register(Box::new(SESSION_CONNECTED.clone()))
        .unwrap();
    registry
        .register(Box::new(SESSION_TICKETS.clone()))
        .unwrap();
    registry
        .register(Box::new(SWAP_OFFER_PENDING.clone()))
        .unwrap();
    registry
        .register(Box::new(WRITE_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(WATCHER_RUNNING.clone()))
        .unwrap();

    // Core metrics (orchestrator operations, refreshes, watcher)
    for metric in ticketswap_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the session gauges reflect the current snapshot.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();
    let session = orchestrator.snapshot().await;
    let status = orchestrator.status().await;

    SESSION_CONNECTED.set(i64::from(session.account.is_some()));
    SESSION_TICKETS.set(session.tickets.len() as i64);
    SWAP_OFFER_PENDING.set(i64::from(session.offer_pending));
    WRITE_IN_FLIGHT.set(i64::from(status.write_in_flight));
    WATCHER_RUNNING.set(i64::from(
        state.watcher().is_some_and(|watcher| watcher.is_running()),
    ));
}

static ADDRESS_REGEX: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"0[xX][0-9a-fA-F]{40}").unwrap());
static NUMERIC_REGEX: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids and addresses with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = ADDRESS_REGEX.replace_all(path, "{address}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_ticket_id() {
        let path = "/api/v1/tickets/12345";
        assert_eq!(normalize_path(path), "/api/v1/tickets/{id}");
    }

    #[test]
    fn test_normalize_path_swap_index() {
        let path = "/api/v1/swaps/0";
        assert_eq!(normalize_path(path), "/api/v1/swaps/{id}");
    }

    #[test]
    fn test_normalize_path_address() {
        let path = "/api/v1/accounts/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed/tickets";
        assert_eq!(normalize_path(path), "/api/v1/accounts/{address}/tickets");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("ticketswap_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vectors that have at least one label set
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        ticketswap_core::metrics::OPERATIONS_TOTAL
            .with_label_values(&["purchase", "success"])
            .inc();
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        SESSION_CONNECTED.set(0);
        SESSION_TICKETS.set(0);

        let output = encode_metrics();

        // HTTP metrics
        assert!(output.contains("ticketswap_http_request_duration_seconds"));
        assert!(output.contains("ticketswap_http_requests_in_flight"));

        // Session metrics
        assert!(output.contains("ticketswap_session_connected"));
        assert!(output.contains("ticketswap_session_tickets"));
        assert!(output.contains("ticketswap_swap_offer_pending"));
        assert!(output.contains("ticketswap_watcher_running"));

        // Core metrics
        assert!(output.contains("ticketswap_operations_total"));
        assert!(output.contains("ticketswap_confirmation_timeouts_total"));
    }
}
