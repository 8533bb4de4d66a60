use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketswap_core::{ContractInfo, OrchestratorError, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub wallet_provider: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a failed read-only view to an HTTP error.
pub fn orchestrator_error(err: OrchestratorError) -> ApiError {
    let status = match &err {
        OrchestratorError::NoWalletProvider => StatusCode::SERVICE_UNAVAILABLE,
        OrchestratorError::NotConnected | OrchestratorError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        OrchestratorError::Ledger(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string())
}

/// A form field that clients may send as a JSON string or number.
///
/// Operations validate the text themselves, so both forms are passed through
/// as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Number(number) => number.to_string(),
        }
    }
}

/// Text of an optional field; a missing field is treated as empty input.
pub fn field_text(value: Option<FieldValue>) -> String {
    value.map(FieldValue::into_text).unwrap_or_default()
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        wallet_provider: state.orchestrator().has_wallet_provider(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/contract
///
/// Contract address, unit price, return fee, and ticket counter.
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ContractInfo>, ApiError> {
    state
        .orchestrator()
        .contract_info()
        .await
        .map(Json)
        .map_err(orchestrator_error)
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
