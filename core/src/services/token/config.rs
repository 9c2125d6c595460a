//! Configuration for the token service

use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use tw_shared::config::JwtConfig;

use crate::errors::DomainError;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// HMAC signing secret
    pub jwt_secret: String,
    /// Signing algorithm, one of HS256, HS384 or HS512
    pub algorithm: Algorithm,
    /// Token lifetime in seconds
    pub token_ttl_seconds: i64,
}

impl TokenServiceConfig {
    /// Token lifetime as a duration
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_seconds)
    }

    /// Check the settings a signer can be built from
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.jwt_secret.is_empty() {
            return Err(DomainError::Config {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        if !is_hmac(self.algorithm) {
            return Err(DomainError::Config {
                message: format!(
                    "Unsupported signing algorithm {:?}, expected HS256, HS384 or HS512",
                    self.algorithm
                ),
            });
        }

        if self.token_ttl_seconds <= 0 {
            return Err(DomainError::Config {
                message: "Token lifetime must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            token_ttl_seconds: 3600,
        }
    }
}

impl TryFrom<&JwtConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(config: &JwtConfig) -> Result<Self, Self::Error> {
        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| DomainError::Config {
            message: format!("Unknown signing algorithm: {}", config.algorithm),
        })?;

        let token_config = Self {
            jwt_secret: config.secret.clone(),
            algorithm,
            token_ttl_seconds: config.token_ttl,
        };
        token_config.validate()?;

        Ok(token_config)
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}
