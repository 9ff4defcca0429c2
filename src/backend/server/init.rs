/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store selection, state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the optional database (connect + migrate)
 * 2. Pick the stores: Postgres when a pool is available, in-memory otherwise
 * 3. Create the application state (verifier, registry, friend service)
 * 4. Create and configure the router
 */
use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Build the application state for `config`
///
/// # Error Handling
///
/// The function is designed to be resilient:
/// - Missing database: in-memory stores are used
/// - Migration failures: logged but don't prevent startup
pub async fn build_state(config: &ServerConfig) -> AppState {
    // Step 1: Load optional database
    let db_pool = load_database(config).await;

    // Step 2-3: Choose stores and create state
    match db_pool {
        Some(pool) => {
            tracing::info!("Using PostgreSQL stores");
            AppState::with_postgres(config.clone(), pool)
        }
        None => {
            tracing::info!("Using in-memory stores (data is lost on restart)");
            AppState::in_memory(config.clone())
        }
    }
}

/// Create and configure the Axum application
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("Initializing convoflow server");

    let app_state = build_state(config).await;

    // Step 4: Create router with all routes
    let app = create_router(app_state);
    tracing::info!("Router configured");

    app
}
