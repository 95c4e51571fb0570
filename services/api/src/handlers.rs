//! Axum Handlers for the Token Relay
//!
//! The relay exchanges the server-held platform key for per-call session
//! credentials. Platform failures are logged and collapsed into a generic
//! 500 so nothing about the key or the platform leaks to the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use voicecall_core::WebCallRequest;

use crate::{
    models::{ErrorResponse, RegisterCallPayload, RegisterCallResponse},
    state::AppState,
};

pub const REGISTER_CALL_FAILED: &str = "Failed to register call.";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

pub enum ApiError {
    MethodNotAllowed,
    RegisterCall(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorResponse {
                    error: METHOD_NOT_ALLOWED.to_string(),
                }),
            )
                .into_response(),
            ApiError::RegisterCall(err) => {
                error!("Error registering call: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: REGISTER_CALL_FAILED.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::RegisterCall(err.into())
    }
}

/// Register a new web call and return its session credentials.
///
/// The request body's `agentId` is ignored; the configured agent is used.
#[utoipa::path(
    post,
    path = "/api/register-call",
    request_body = RegisterCallPayload,
    responses(
        (status = 200, description = "Platform credentials, passed through unchanged", body = RegisterCallResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Registration failed", body = ErrorResponse)
    )
)]
pub async fn register_call(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let agent_id = state.config.require_agent_id()?;
    let request = WebCallRequest::new(agent_id, state.config.sample_rate);

    let response = state.platform.create_web_call(&request).await?;
    info!(agent_id = %request.agent_id, "Call registered");
    Ok(Json(response))
}

/// Rejects every method other than POST on the register-call route.
pub async fn method_not_allowed() -> ApiError {
    warn!("Rejected non-POST request to /api/register-call");
    ApiError::MethodNotAllowed
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
