//! Axum Router Configuration
//!
//! This module defines the HTTP routing for the relay, including the
//! OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, RegisterCallPayload, RegisterCallResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::register_call, handlers::health_check),
    components(schemas(RegisterCallPayload, RegisterCallResponse, ErrorResponse)),
    tags(
        (name = "Voicecall Relay", description = "Session credential issuance for browser voice calls")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(
            "/api/register-call",
            post(handlers::register_call).fallback(handlers::method_not_allowed),
        )
        .with_state(app_state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
}
