//! Main token service implementation

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{crypto, DecodingKey, EncodingKey, Header};
use tracing::{debug, error};

use crate::clock::{Clock, SystemClock};
use crate::domain::entities::token::{Claims, Token};
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// Service for issuing and validating signed tokens
///
/// Holds the signing secret and a clock; it never touches the whitelist.
pub struct TokenService {
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Creates a new token service driven by the system clock
    ///
    /// # Arguments
    ///
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService` instance or a `DomainError::Config` if the
    /// configuration cannot produce a signer
    pub fn new(config: TokenServiceConfig) -> Result<Self, DomainError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new token service reading time from `clock`
    pub fn with_clock(
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        })
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Current Unix time according to the injected clock
    pub fn now(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Issues a signed token for `subject`
    ///
    /// # Arguments
    ///
    /// * `subject` - Identifier of the authenticated principal
    /// * `ttl` - Lifetime of the token, must be at least one second
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - Token with a fresh token ID, `issued_at = now` and
    ///   `expires_at = now + ttl`
    /// * `Err(DomainError)` - Invalid arguments or signing failure
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<Token, DomainError> {
        if subject.is_empty() {
            return Err(DomainError::Validation {
                message: "Token subject must not be empty".to_string(),
            });
        }

        let ttl_seconds = ttl.num_seconds();
        if ttl_seconds <= 0 {
            return Err(DomainError::Validation {
                message: "Token lifetime must be at least one second".to_string(),
            });
        }

        let now = self.clock.now_secs();
        let expires_at = now.checked_add(ttl_seconds).ok_or_else(|| DomainError::Validation {
            message: "Token lifetime overflows the expiry timestamp".to_string(),
        })?;

        let claims = Claims::new(subject, now, expires_at);
        let header = Header::new(self.config.algorithm);
        let signing_input = Token::signing_input_for(&header, &claims)?;

        let signature = crypto::sign(signing_input.as_bytes(), &self.encoding_key, self.config.algorithm)
            .map_err(|e| {
                error!("Failed to sign token for subject {}: {}", subject, e);
                TokenError::SigningFailed
            })?;

        debug!(
            "Issued token {} for subject {} expiring at {}",
            claims.jti, subject, expires_at
        );

        Ok(Token::from_parts(
            self.config.algorithm,
            claims,
            signing_input,
            signature,
        ))
    }

    /// Checks the signature and expiry of a decoded token
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Signature matches and `now < expires_at`
    /// * `Err(TokenError::InvalidSignature)` - Signature mismatch, or the
    ///   header names a different algorithm than the configured one
    /// * `Err(TokenError::Expired)` - The token's lifetime has passed
    pub fn validate(&self, token: &Token) -> Result<(), TokenError> {
        if token.algorithm() != self.config.algorithm {
            return Err(TokenError::InvalidSignature);
        }

        let signature_matches = crypto::verify(
            token.signature(),
            token.signing_input().as_bytes(),
            &self.decoding_key,
            self.config.algorithm,
        )
        .map_err(|_| TokenError::InvalidSignature)?;

        if !signature_matches {
            return Err(TokenError::InvalidSignature);
        }

        if token.is_expired_at(self.clock.now_secs()) {
            return Err(TokenError::Expired);
        }

        Ok(())
    }

    /// Decodes the wire form and validates the result
    pub fn parse(&self, raw: &str) -> Result<Token, TokenError> {
        let token = Token::decode(raw)?;
        self.validate(&token)?;
        Ok(token)
    }
}
