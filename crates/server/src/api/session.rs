//! Session API handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use ticketswap_core::orchestrator::OrchestratorStatus;
use ticketswap_core::session::RenderedStatus;
use ticketswap_core::{SessionSnapshot, Status};
use tracing::info;

use super::middleware::Caller;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Outcome of an orchestrator operation.
///
/// Operations always answer 200; the rendered status carries success or
/// failure.
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub status: RenderedStatus,
    pub session: SessionSnapshot,
}

impl OperationResponse {
    pub async fn new(state: &AppState, status: Status) -> Self {
        Self {
            status: status.render(),
            session: state.orchestrator().snapshot().await,
        }
    }
}

/// Current session plus orchestrator runtime state
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: RenderedStatus,
    pub session: SessionSnapshot,
    pub orchestrator: OrchestratorStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let orchestrator = state.orchestrator();
    let session = orchestrator.snapshot().await;

    Json(SessionResponse {
        status: session.status.render(),
        session,
        orchestrator: orchestrator.status().await,
    })
}

/// POST /api/v1/session/connect
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Json<OperationResponse> {
    info!("{} requested wallet connection", caller);
    let status = state.orchestrator().connect().await;
    Json(OperationResponse::new(&state, status).await)
}
