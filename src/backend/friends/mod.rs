//! Friend-Request Module
//!
//! - **`service`** - `FriendService`: graph mutation followed by room notifications
//! - **`handlers`** - REST endpoints under `/api/friends`

pub mod handlers;
pub mod service;

pub use service::FriendService;
