//! Authentication test helpers
//!
//! Provides the test configuration and token generation.

use std::time::Duration;

use convoflow::backend::auth::JwtVerifier;
use convoflow::backend::server::ServerConfig;
use uuid::Uuid;

/// Secret shared by every test app
pub const TEST_SECRET: &str = "convoflow-test-secret";

/// Validated configuration for tests
pub fn test_config() -> ServerConfig {
    ServerConfig::builder()
        .jwt_secret(TEST_SECRET)
        .handshake_timeout(Duration::from_millis(200))
        .max_payload_bytes(1024)
        .build()
        .expect("test config is valid")
}

/// Generate a test JWT token valid for an hour
pub fn create_test_token(user_id: Uuid, username: &str) -> String {
    JwtVerifier::new(TEST_SECRET)
        .issue(user_id, Some(username), chrono::Duration::hours(1))
        .expect("Failed to create test token")
}

/// Generate a token that has already expired
pub fn create_expired_token(user_id: Uuid) -> String {
    JwtVerifier::new(TEST_SECRET)
        .issue(user_id, None, chrono::Duration::hours(-1))
        .expect("Failed to create test token")
}

/// Generate a token signed with the wrong secret
pub fn create_foreign_token(user_id: Uuid) -> String {
    JwtVerifier::new("some-other-secret")
        .issue(user_id, None, chrono::Duration::hours(1))
        .expect("Failed to create test token")
}
