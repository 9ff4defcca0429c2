/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Layers
 *
 * - `TraceLayer` logs every HTTP request
 * - `CorsLayer` allows the configured origin (any origin when unset)
 *
 * Unknown routes get a JSON 404.
 */
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// 1. **Chat Routes**: `/ws`
/// 2. **API Routes**: friends, profile, history, payloads, health
/// 3. **Fallback Handler**: JSON 404
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_chat_routes(Router::new());
    let router = configure_api_routes(router, app_state.config.max_payload_bytes);

    let router = router.fallback(|| async {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found", "status": 404 })),
        )
    });

    router
        .layer(cors_layer(app_state.config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!("Invalid CORS origin ({}), allowing any origin", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
