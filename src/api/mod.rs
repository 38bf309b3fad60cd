//! REST API module using Axum
//!
//! HTTP surface for the handheld inspection UI:
//! - state-transition endpoints driving the workflow
//! - catalog data endpoints (projects, selection options)
//! - image delivery (one-shot capture, cached slots, viewfinder stream)

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use envelope::ApiErrorResponse;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `INSPECTA_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for development (e.g., a UI dev server).
fn build_cors_layer() -> CorsLayer {
    match std::env::var("INSPECTA_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => {
            // No cross-origin allowed - the handheld UI is same-origin
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::state_routes(state.clone()))
        .merge(routes::media_routes(state))
        .merge(routes::health_routes())
        .fallback(|| async { ApiErrorResponse::not_found("not-found", "unknown endpoint") })
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
