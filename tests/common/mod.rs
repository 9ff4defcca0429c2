//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-memory application harness (router + session clients)
//! - Authentication test helpers
//! - Custom assertion macros

pub mod assertions;
#[cfg(feature = "ssr")]
pub mod auth_helpers;
#[cfg(feature = "ssr")]
pub mod test_app;

#[cfg(feature = "ssr")]
pub use auth_helpers::*;
#[cfg(feature = "ssr")]
pub use test_app::*;
