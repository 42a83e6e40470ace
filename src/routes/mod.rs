//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the component-listing API and the identity-linking
//! surface under a single Axum router. Authentication and tenant resolution
//! are handled by the platform edge in front of this service.

pub mod components;
pub mod linking;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/apps/{app_id}/components", get(components::app_components))
        .route("/api/organizations/{org_id}/components", get(components::org_components))
        .route("/extensions/chat/link/{signed_params}", get(linking::link_identity))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
