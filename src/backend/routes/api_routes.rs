/**
 * API Route Handlers
 *
 * This module wires the REST endpoints. Every route except `/health`
 * requires `Authorization: Bearer <token>` (checked by the `AuthUser`
 * extractor in each handler).
 *
 * # Routes
 *
 * ## Friends
 * - `POST /api/friends/request` - Send a friend request
 * - `POST /api/friends/accept` - Accept a pending request
 * - `GET /api/friends` - Friends and strangers with pending flags
 * - `GET /api/profile` - Caller's profile
 *
 * ## Messages
 * - `GET /api/messages/{other_user_id}` - Chat history (friends only)
 * - `POST /api/payloads` - Upload a voice/image payload
 * - `GET /api/payloads/{payload_id}` - Download a payload
 */
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::backend::friends::handlers::{
    accept_friend_request, get_profile, list_relations, send_friend_request,
};
use crate::backend::messaging::handlers::{download_payload, get_history, upload_payload};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// `max_payload_bytes` bounds the upload body; the payload store enforces
/// the same limit.
pub fn configure_api_routes(router: Router<AppState>, max_payload_bytes: usize) -> Router<AppState> {
    router
        .route("/health", get(health))
        // Friend request endpoints
        .route("/api/friends/request", post(send_friend_request))
        .route("/api/friends/accept", post(accept_friend_request))
        .route("/api/friends", get(list_relations))
        .route("/api/profile", get(get_profile))
        // Message endpoints
        .route("/api/messages/{other_user_id}", get(get_history))
        .route(
            "/api/payloads",
            post(upload_payload).layer(DefaultBodyLimit::max(max_payload_bytes)),
        )
        .route("/api/payloads/{payload_id}", get(download_payload))
}

/// Liveness probe (GET /health)
async fn health() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}
