/**
 * Error Conversion
 *
 * This module converts backend errors into the two shapes clients see.
 *
 * # HTTP Response Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers:
 *
 * ```json
 * {
 *   "error": "You can only message friends",
 *   "kind": "not_friends",
 *   "status": 403
 * }
 * ```
 *
 * # Event Conversion
 *
 * On a messaging connection the same error becomes an `error` event sent to
 * the originating connection only:
 *
 * ```json
 * { "event": "error", "data": { "kind": "not_friends", "reason": "You can only message friends" } }
 * ```
 */
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::backend::error::types::BackendError;
use crate::shared::event::ServerEvent;

impl BackendError {
    /// Render as an `error` event for the originating connection
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.kind(), self.message())
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        let mut response = Response::new(Body::from(body.to_string()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl From<BackendError> for StatusCode {
    fn from(err: BackendError) -> Self {
        err.status_code()
    }
}
