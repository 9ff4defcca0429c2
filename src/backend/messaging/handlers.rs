//! Messaging HTTP Handlers
//!
//! This module contains the HTTP handlers for chat history and binary
//! payload upload/download.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{AuthorizationError, BackendResult, NotFoundError};
use crate::backend::messaging::PayloadId;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{HistoryPage, HistoryQuery};

/// Response of a payload upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadUploaded {
    pub payload_id: PayloadId,
}

/// Chat history with another user (GET /api/messages/{otherUserId})
///
/// Only available between friends. Ascending by time, paged with
/// `?limit=&offset=`.
pub async fn get_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(other_user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> BackendResult<Json<HistoryPage>> {
    if !state.graph.are_friends(user.id(), other_user_id).await? {
        tracing::warn!(
            "[Messages] History between non-friends {} and {} refused",
            user.id(),
            other_user_id
        );
        return Err(AuthorizationError::NotFriends.into());
    }

    let query = query.with_default_limit(state.config.history_page_limit);
    let page = state.messages.history(user.id(), other_user_id, query).await?;
    tracing::debug!(
        "[Messages] {} fetched {} message(s) with {}",
        user.id(),
        page.messages.len(),
        other_user_id
    );
    Ok(Json(page))
}

/// Upload a voice note or image (POST /api/payloads)
///
/// The raw request body is the payload.
pub async fn upload_payload(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> BackendResult<(StatusCode, Json<PayloadUploaded>)> {
    let payload_id = state.payloads.put(user.id(), body).await?;
    Ok((StatusCode::CREATED, Json(PayloadUploaded { payload_id })))
}

/// Download a payload (GET /api/payloads/{id})
pub async fn download_payload(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> BackendResult<impl IntoResponse> {
    let id = PayloadId::parse(&raw_id).ok_or_else(|| NotFoundError::Payload(raw_id.clone()))?;
    let bytes = state
        .payloads
        .get(id)
        .await?
        .ok_or(NotFoundError::Payload(raw_id))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
