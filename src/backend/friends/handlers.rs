//! Friend-request HTTP handlers
//!
//! All routes require `Authorization: Bearer <token>`. Rejections are
//! rendered by `BackendError`'s `IntoResponse` as `{error, kind, status}`.

use axum::{extract::State, Json};

use crate::backend::error::BackendResult;
use crate::backend::friends::FriendService;
use crate::backend::middleware::AuthUser;
use crate::shared::messaging::{
    AcceptFriendRequestRequest, FriendRequestResponse, ProfileResponse, RelationsView,
    SendFriendRequestRequest,
};

/// Send a friend request (POST /api/friends/request)
pub async fn send_friend_request(
    State(friends): State<FriendService>,
    user: AuthUser,
    Json(request): Json<SendFriendRequestRequest>,
) -> BackendResult<Json<FriendRequestResponse>> {
    friends.send_request(user.id(), request.receiver_id).await?;
    Ok(Json(FriendRequestResponse::ok()))
}

/// Accept a pending request (POST /api/friends/accept)
pub async fn accept_friend_request(
    State(friends): State<FriendService>,
    user: AuthUser,
    Json(request): Json<AcceptFriendRequestRequest>,
) -> BackendResult<Json<FriendRequestResponse>> {
    friends.accept_request(request.sender_id, user.id()).await?;
    Ok(Json(FriendRequestResponse::ok()))
}

/// Friends and strangers of the caller (GET /api/friends)
pub async fn list_relations(
    State(friends): State<FriendService>,
    user: AuthUser,
) -> BackendResult<Json<RelationsView>> {
    Ok(Json(friends.list_relations(user.id()).await?))
}

/// Caller's profile (GET /api/profile)
pub async fn get_profile(
    State(friends): State<FriendService>,
    user: AuthUser,
) -> BackendResult<Json<ProfileResponse>> {
    Ok(Json(friends.profile(user.id()).await?))
}
