//! Real-time route
//!
//! - `GET /ws` - WebSocket messaging session. The credential may be given as
//!   `?token=`, as `Authorization: Bearer`, or as the first frame.

use axum::routing::get;
use axum::Router;

use crate::backend::server::state::AppState;
use crate::backend::session::ws_handler;

pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(ws_handler))
}
