//! # Infrastructure Layer
//!
//! Concrete implementations behind the Tokenward core:
//! - **Cache**: Redis client with retry logic and the Redis-backed
//!   `WhitelistStore`
//! - **Configuration**: environment loading (`.env` aware)
//! - **Tracing**: subscriber setup driven by `LoggingConfig`
//!
//! [`initialize`] wires everything into a ready-to-use
//! [`AuthenticationService`].

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tw_core::errors::DomainError;
use tw_core::services::{AuthenticationService, TokenService, TokenServiceConfig};

/// Cache module - Redis client and whitelist store
pub mod cache;

use cache::{RedisClient, RedisWhitelistStore};

/// Configuration module for infrastructure services
pub mod config {
    //! Re-exports of the shared configuration consumed by this crate

    pub use tw_shared::config::{
        AppConfig, AuthConfig, CacheConfig, Environment, LogFormat, LoggingConfig, WhitelistConfig,
    };
}

use config::{AppConfig, LogFormat, LoggingConfig};

/// Authentication service backed by Redis
pub type RedisAuthenticationService = AuthenticationService<RedisWhitelistStore>;

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Token authentication over the Redis whitelist
    pub authentication: Arc<RedisAuthenticationService>,
    /// Shared Redis client, e.g. for health checks
    pub redis: RedisClient,
}

/// Initialize infrastructure services from the environment
///
/// Loads `.env` when present, then builds the Redis client, the whitelist
/// store and the authentication service.
pub async fn initialize() -> Result<InfrastructureServices, InfrastructureError> {
    let config = load_config()?;
    initialize_with_config(&config).await
}

/// Initialize infrastructure services from an explicit configuration
pub async fn initialize_with_config(
    config: &AppConfig,
) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!(
        "Initializing infrastructure services ({} environment)...",
        config.environment
    );

    if config.auth.jwt.is_using_default_secret() {
        if config.environment.is_production() {
            return Err(InfrastructureError::Config(
                "JWT_SECRET must be set in production".to_string(),
            ));
        }
        tracing::warn!("Using the default JWT secret; set JWT_SECRET outside development");
    }

    let token_config = TokenServiceConfig::try_from(&config.auth.jwt)?;
    let tokens = TokenService::new(token_config)?;

    let redis = RedisClient::new(config.cache.clone()).await?;
    let whitelist = RedisWhitelistStore::from_config(redis.clone(), &config.auth.whitelist);

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        authentication: Arc::new(AuthenticationService::new(tokens, whitelist)),
        redis,
    })
}

/// Load application configuration from environment
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    Ok(AppConfig::from_env())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level when set. Calling this twice is
/// an error rather than a panic.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), InfrastructureError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| InfrastructureError::Config(format!("Invalid log level: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.colored)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| InfrastructureError::General(format!("Failed to install tracing: {}", e)))
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by the core while wiring services
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Cache(e) => DomainError::store_unavailable(e),
            InfrastructureError::Config(message) => DomainError::Config { message },
            InfrastructureError::Domain(e) => e,
            InfrastructureError::General(message) => DomainError::Internal { message },
        }
    }
}
