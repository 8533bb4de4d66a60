//! Swap offer API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use ticketswap_core::SwapOffer;
use tracing::info;

use super::handlers::{field_text, orchestrator_error, ApiError, FieldValue};
use super::middleware::Caller;
use super::session::OperationResponse;
use crate::state::AppState;

/// Request body for offering a swap
#[derive(Debug, Deserialize)]
pub struct CreateOfferBody {
    /// Ticket the connected account gives up
    #[serde(default)]
    pub from_ticket: Option<FieldValue>,
    /// Ticket it wants in return
    #[serde(default)]
    pub to_ticket: Option<FieldValue>,
}

/// Request body for accepting a swap
#[derive(Debug, Deserialize)]
pub struct AcceptOfferBody {
    /// Ticket number, or the wallet address holding it
    #[serde(default)]
    pub target: Option<FieldValue>,
}

/// POST /api/v1/swaps/offer
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<CreateOfferBody>,
) -> Json<OperationResponse> {
    let from_ticket = field_text(body.from_ticket);
    let to_ticket = field_text(body.to_ticket);
    info!(
        "{} requested swap offer {:?} -> {:?}",
        caller, from_ticket, to_ticket
    );

    let status = state
        .orchestrator()
        .create_swap_offer(&from_ticket, &to_ticket)
        .await;
    Json(OperationResponse::new(&state, status).await)
}

/// POST /api/v1/swaps/accept
pub async fn accept_offer(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<AcceptOfferBody>,
) -> Json<OperationResponse> {
    let target = field_text(body.target);
    info!("{} requested swap accept for {:?}", caller, target);

    let status = state.orchestrator().accept_swap_offer(&target).await;
    Json(OperationResponse::new(&state, status).await)
}

/// GET /api/v1/swaps/{index}
pub async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(index): Path<u64>,
) -> Result<Json<SwapOffer>, ApiError> {
    state
        .orchestrator()
        .swap_offer(index)
        .await
        .map(Json)
        .map_err(orchestrator_error)
}
