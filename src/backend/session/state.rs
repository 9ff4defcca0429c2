//! Per-connection session state
//!
//! ```text
//! Unauthenticated ──authenticate──▶ Authenticated ──close──▶ Closed
//!        │                                                     ▲
//!        └──────────────────────close──────────────────────────┘
//! ```
//!
//! Authentication happens once, at connect time. There is no way back to
//! `Unauthenticated`; re-authenticating needs a new connection.

use uuid::Uuid;

use crate::backend::realtime::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated {
        user_id: Uuid,
        connection_id: ConnectionId,
    },
    Closed,
}

impl SessionState {
    /// Move to `Authenticated`
    ///
    /// Returns `false` (and leaves the state alone) unless the session is
    /// still unauthenticated.
    pub fn authenticate(&mut self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        match self {
            SessionState::Unauthenticated => {
                *self = SessionState::Authenticated {
                    user_id,
                    connection_id,
                };
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) {
        *self = SessionState::Closed;
    }

    /// Inbound events are only processed once authenticated
    pub fn accepts_events(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            SessionState::Authenticated { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}
