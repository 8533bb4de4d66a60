use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, session, swaps, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes behind the configured authenticator
    let api_routes = Router::new()
        .route("/config", get(handlers::get_config))
        // Session
        .route("/session", get(session::get_session))
        .route("/session/connect", post(session::connect))
        // Tickets
        .route("/tickets/purchase", post(tickets::purchase))
        .route("/tickets/refund", post(tickets::refund))
        .route("/tickets/lookup", post(tickets::lookup))
        .route("/tickets/refresh", post(tickets::refresh))
        .route("/tickets/{id}", get(tickets::get_ticket))
        // Swap offers
        .route("/swaps/offer", post(swaps::create_offer))
        .route("/swaps/accept", post(swaps::accept_offer))
        .route("/swaps/{index}", get(swaps::get_offer))
        // Contract
        .route("/contract", get(handlers::get_contract))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ))
        // Health stays reachable without credentials
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
