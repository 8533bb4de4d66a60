//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketswap_core::orchestrator::{parse_address, parse_ticket_id};
use ticketswap_core::{SessionSnapshot, Ticket};
use tracing::info;

use super::handlers::{error_response, field_text, orchestrator_error, ApiError, FieldValue};
use super::middleware::Caller;
use super::session::OperationResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for buying tickets
#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    /// Number of tickets, as a number or text; anything but a positive whole
    /// number is rejected by the orchestrator
    #[serde(default)]
    pub count: Option<FieldValue>,
}

/// Request body for returning a ticket
#[derive(Debug, Deserialize)]
pub struct RefundBody {
    #[serde(default)]
    pub ticket: Option<FieldValue>,
}

/// Request body for looking up an address's ticket
#[derive(Debug, Deserialize)]
pub struct LookupBody {
    #[serde(default)]
    pub address: String,
}

/// Request body for refreshing the ticket projection
#[derive(Debug, Default, Deserialize)]
pub struct RefreshBody {
    /// Must be the connected account when given
    #[serde(default)]
    pub address: Option<String>,
}

/// Response for a refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// False when the ledger could not be read; the projection is unchanged
    pub refreshed: bool,
    pub session: SessionSnapshot,
}

/// A ticket with its current availability
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// As reported by `isTicketAvailable`
    pub available: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/tickets/purchase
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<PurchaseBody>,
) -> Json<OperationResponse> {
    let count = field_text(body.count);
    info!("{} requested purchase of {:?} ticket(s)", caller, count);
    let status = state.orchestrator().purchase_input(&count).await;
    Json(OperationResponse::new(&state, status).await)
}

/// POST /api/v1/tickets/refund
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<RefundBody>,
) -> Json<OperationResponse> {
    let ticket = field_text(body.ticket);
    info!("{} requested refund of ticket {:?}", caller, ticket);
    let status = state.orchestrator().refund(&ticket).await;
    Json(OperationResponse::new(&state, status).await)
}

/// POST /api/v1/tickets/lookup
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LookupBody>,
) -> Json<OperationResponse> {
    let status = state.orchestrator().lookup_by_address(&body.address).await;
    Json(OperationResponse::new(&state, status).await)
}

/// POST /api/v1/tickets/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let orchestrator = state.orchestrator();

    let owner = orchestrator.connected_account().await.ok_or_else(|| {
        error_response(StatusCode::BAD_REQUEST, "Please connect a wallet first.")
    })?;
    if let Some(address) = body.address {
        let requested = parse_address(&address)
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Invalid wallet address"))?;
        if requested != owner {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Only the connected account's tickets can be refreshed",
            ));
        }
    }

    let refreshed = orchestrator.refresh_tickets(owner).await;
    Ok(Json(RefreshResponse {
        refreshed,
        session: orchestrator.snapshot().await,
    }))
}

/// GET /api/v1/tickets/{id}
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let id = parse_ticket_id(&id).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid ticket number: {}", id),
        )
    })?;

    let orchestrator = state.orchestrator();
    let (ticket, available) =
        tokio::try_join!(orchestrator.ticket(id), orchestrator.is_ticket_available(id))
            .map_err(orchestrator_error)?;

    match ticket {
        Some(ticket) => Ok(Json(TicketResponse { ticket, available })),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Ticket not found: {}", id),
        )),
    }
}
