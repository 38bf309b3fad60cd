//! API route definitions
//!
//! Organizes endpoints for the handheld UI:
//! - /states/* - one POST per workflow state transition
//! - /api/v1/projects, /api/v1/options - catalog data for the UI
//! - /capture, /capture/cache/:slot, /video_feed - image delivery
//! - /health - liveness

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// One POST endpoint per workflow state.
pub fn state_routes(state: ApiState) -> Router {
    Router::new()
        .route("/states/project", post(handlers::post_project))
        .route("/states/standby", post(handlers::post_standby))
        .route("/states/label", post(handlers::post_label))
        .route("/states/selection", post(handlers::post_selection))
        .route("/states/criteria", post(handlers::post_criteria))
        .route("/states/context", post(handlers::post_context))
        .route("/states/detail", post(handlers::post_detail))
        .route("/states/confirmation", post(handlers::post_confirmation))
        .route("/states/end", post(handlers::post_end))
        .with_state(state)
}

/// Catalog data endpoints for the UI.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/projects", get(handlers::get_projects))
        .route("/options", get(handlers::get_options))
        .with_state(state)
}

/// Image delivery: one-shot capture, cached slots, live viewfinder.
pub fn media_routes(state: ApiState) -> Router {
    Router::new()
        .route("/capture", get(handlers::get_capture))
        .route("/capture/cache/:slot", get(handlers::get_cached_image))
        .route("/video_feed", get(handlers::get_video_feed))
        .with_state(state)
}

/// Health endpoint at root level.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::get_health))
}
