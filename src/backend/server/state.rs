/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The identity verifier
 * - The social graph, message and payload stores (trait objects)
 * - The connection registry
 * - The friend-request orchestrator
 * - Configuration and the optional database pool
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share: stores are
 * `Arc<dyn Trait + Send + Sync>`, the registry is internally `Arc`ed.
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers and extractors to take
 * only the part of the state they need.
 *
 * ```rust
 * use convoflow::backend::server::{AppState, ServerConfig};
 *
 * let state = AppState::in_memory(ServerConfig::default());
 * assert_eq!(state.registry.connection_count(), 0);
 * ```
 */
use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::JwtVerifier;
use crate::backend::friends::FriendService;
use crate::backend::graph::{MemoryGraphStore, PgGraphStore, SocialGraphStore};
use crate::backend::messaging::{
    MemoryMessageStore, MemoryPayloadStore, MessageStore, PayloadStore, PgMessageStore,
};
use crate::backend::realtime::ConnectionRegistry;
use crate::backend::server::config::ServerConfig;

/// Application state shared by every handler and connection
#[derive(Clone)]
pub struct AppState {
    /// Verifies bearer tokens for REST calls and the WebSocket handshake
    pub verifier: Arc<JwtVerifier>,

    pub graph: Arc<dyn SocialGraphStore>,

    pub messages: Arc<dyn MessageStore>,

    /// Voice/image bytes, always in memory
    pub payloads: Arc<dyn PayloadStore>,

    /// Live connections by user
    pub registry: ConnectionRegistry,

    pub friends: FriendService,

    pub config: Arc<ServerConfig>,

    /// Database connection pool
    ///
    /// This is `None` when the server runs on the in-memory stores.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Assemble a state from explicit stores
    pub fn new(
        config: ServerConfig,
        graph: Arc<dyn SocialGraphStore>,
        messages: Arc<dyn MessageStore>,
        db_pool: Option<PgPool>,
    ) -> Self {
        let registry = ConnectionRegistry::new(config.outbound_buffer);
        let payloads: Arc<dyn PayloadStore> =
            Arc::new(MemoryPayloadStore::new(config.max_payload_bytes));

        Self {
            verifier: Arc::new(JwtVerifier::new(&config.jwt_secret)),
            friends: FriendService::new(graph.clone(), registry.clone()),
            graph,
            messages,
            payloads,
            registry,
            config: Arc::new(config),
            db_pool,
        }
    }

    /// State backed entirely by in-memory stores
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryGraphStore::new()),
            Arc::new(MemoryMessageStore::new()),
            None,
        )
    }

    /// State backed by Postgres for the graph and message stores
    pub fn with_postgres(config: ServerConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgGraphStore::new(pool.clone())),
            Arc::new(PgMessageStore::new(pool.clone())),
            Some(pool),
        )
    }
}

/// Lets the `AuthUser` extractor find the verifier
impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for FriendService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.friends.clone()
    }
}

impl FromRef<AppState> for ConnectionRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
