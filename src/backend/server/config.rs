/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration,
 * and the optional PostgreSQL database connection.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 *
 * 1. Built-in defaults (`ServerConfig::default()`)
 * 2. A TOML file named by `CONVOFLOW_CONFIG`, if set
 * 3. Environment variables (`.env` is loaded by the binary first)
 *
 * | Variable               | Field                   | Default |
 * |------------------------|-------------------------|---------|
 * | `SERVER_PORT`          | `port`                  | 5000    |
 * | `JWT_SECRET`           | `jwt_secret`            | (none)  |
 * | `DATABASE_URL`         | `database_url`          | (none)  |
 * | `HANDSHAKE_TIMEOUT_MS` | `handshake_timeout_ms`  | 5000    |
 * | `OUTBOUND_BUFFER`      | `outbound_buffer`       | 256     |
 * | `HISTORY_PAGE_LIMIT`   | `history_page_limit`    | 50      |
 * | `MAX_PAYLOAD_BYTES`    | `max_payload_bytes`     | 10 MiB  |
 * | `CORS_ORIGIN`          | `cors_origin`           | any     |
 *
 * # Database
 *
 * The database is optional. Without `DATABASE_URL`, or when the connection
 * fails, the server runs on the in-memory stores.
 */
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::backend::messaging::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::backend::realtime::DEFAULT_OUTBOX_CAPACITY;
use crate::shared::messaging::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_ENV: &str = "CONVOFLOW_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("JWT secret must not be empty")]
    MissingSecret,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Server configuration
///
/// `Debug` redacts the JWT secret and the database URL, which may carry a
/// password.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,
    /// HS256 secret shared with the credential issuer
    pub jwt_secret: String,
    /// Postgres URL; in-memory stores when `None`
    pub database_url: Option<String>,
    /// How long a connection may take to present its credential
    pub handshake_timeout_ms: u64,
    /// Outbox capacity per connection, in events
    pub outbound_buffer: usize,
    /// History page size when the client names none
    pub history_page_limit: u32,
    pub max_payload_bytes: usize,
    /// Allowed CORS origin; any origin when `None`
    pub cors_origin: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"[redacted]")
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("handshake_timeout_ms", &self.handshake_timeout_ms)
            .field("outbound_buffer", &self.outbound_buffer)
            .field("history_page_limit", &self.history_page_limit)
            .field("max_payload_bytes", &self.max_payload_bytes)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            jwt_secret: String::new(),
            database_url: None,
            handshake_timeout_ms: 5000,
            outbound_buffer: DEFAULT_OUTBOX_CAPACITY,
            history_page_limit: DEFAULT_HISTORY_LIMIT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            cors_origin: None,
        }
    }
}

/// On-disk shape of the TOML file; every key is optional
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    jwt_secret: Option<String>,
    database_url: Option<String>,
    handshake_timeout_ms: Option<u64>,
    outbound_buffer: Option<usize>,
    history_page_limit: Option<u32>,
    max_payload_bytes: Option<usize>,
    cors_origin: Option<String>,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load defaults, then the TOML file, then the environment, and validate
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            tracing::info!("Loading configuration from {}", path);
            config.apply_file(Path::new(&path))?;
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML file
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.apply_toml(&contents)
    }

    /// Overlay the keys present in a TOML document
    pub fn apply_toml(&mut self, contents: &str) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(contents)?;

        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(secret) = file.jwt_secret {
            self.jwt_secret = secret;
        }
        if let Some(url) = file.database_url {
            self.database_url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(timeout) = file.handshake_timeout_ms {
            self.handshake_timeout_ms = timeout;
        }
        if let Some(buffer) = file.outbound_buffer {
            self.outbound_buffer = buffer;
        }
        if let Some(limit) = file.history_page_limit {
            self.history_page_limit = limit;
        }
        if let Some(max) = file.max_payload_bytes {
            self.max_payload_bytes = max;
        }
        if let Some(origin) = file.cors_origin {
            self.cors_origin = Some(origin).filter(|origin| !origin.is_empty());
        }
        Ok(())
    }

    /// Overlay the environment variables that are set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(port) = parse_env("SERVER_PORT")? {
            self.port = port;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(timeout) = parse_env("HANDSHAKE_TIMEOUT_MS")? {
            self.handshake_timeout_ms = timeout;
        }
        if let Some(buffer) = parse_env("OUTBOUND_BUFFER")? {
            self.outbound_buffer = buffer;
        }
        if let Some(limit) = parse_env("HISTORY_PAGE_LIMIT")? {
            self.history_page_limit = limit;
        }
        if let Some(max) = parse_env("MAX_PAYLOAD_BYTES")? {
            self.max_payload_bytes = max;
        }
        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            self.cors_origin = Some(origin).filter(|origin| !origin.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.handshake_timeout_ms == 0 {
            return Err(ConfigError::Zero("handshake_timeout_ms"));
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::Zero("outbound_buffer"));
        }
        if self.history_page_limit == 0 {
            return Err(ConfigError::Zero("history_page_limit"));
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Zero("max_payload_bytes"));
        }
        if self.history_page_limit > MAX_HISTORY_LIMIT {
            tracing::warn!(
                "history_page_limit {} exceeds {}, pages will be clamped",
                self.history_page_limit,
                MAX_HISTORY_LIMIT
            );
        }
        Ok(())
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn listen_addr(&self) -> std::net::SocketAddr {
        ([0, 0, 0, 0], self.port).into()
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}

/// Builder for [`ServerConfig`], starting from the defaults
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn outbound_buffer(mut self, events: usize) -> Self {
        self.config.outbound_buffer = events;
        self
    }

    pub fn history_page_limit(mut self, limit: u32) -> Self {
        self.config.history_page_limit = limit;
        self
    }

    pub fn max_payload_bytes(mut self, max: usize) -> Self {
        self.config.max_payload_bytes = max;
        self
    }

    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_origin = Some(origin.into());
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Connect to Postgres and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is configured and reachable
/// - `None` if `database_url` is unset or the connection fails
///
/// Errors are logged but do not prevent server startup.
pub async fn load_database(config: &ServerConfig) -> Option<PgPool> {
    let database_url = match &config.database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DATABASE_URL not set. Using in-memory stores.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Using in-memory stores.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
