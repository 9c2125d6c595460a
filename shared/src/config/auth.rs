//! Authentication and token whitelist configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// JWT signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,

    /// Algorithm for token signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            algorithm: default_algorithm(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());
        let algorithm = std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| default_algorithm());
        let token_ttl = std::env::var("JWT_TOKEN_TTL")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(default_token_ttl);

        Self {
            secret,
            algorithm,
            token_ttl,
        }
    }

    /// Set token lifetime in minutes
    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl = minutes * 60;
        self
    }

    /// Set the signing algorithm name
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Token whitelist configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhitelistConfig {
    /// Namespace prepended to the subject to build a whitelist key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

impl WhitelistConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            key_prefix: std::env::var("WHITELIST_KEY_PREFIX")
                .unwrap_or_else(|_| default_key_prefix()),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Whitelist configuration
    #[serde(default)]
    pub whitelist: WhitelistConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            whitelist: WhitelistConfig::from_env(),
        }
    }

    /// Get token lifetime in seconds
    pub fn token_ttl_seconds(&self) -> i64 {
        self.jwt.token_ttl
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_token_ttl() -> i64 {
    3600 // 1 hour
}

fn default_key_prefix() -> String {
    String::from("tokens:user:")
}
