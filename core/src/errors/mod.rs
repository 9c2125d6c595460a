//! Domain-specific error types and error handling.

mod types;


// Re-export all error types
pub use types::TokenError;

use thiserror::Error;

/// Core domain errors
///
/// Token-level failures are carried by [`TokenError`]. `StoreUnavailable` is the
/// only infrastructure failure and must never be folded into an authentication
/// rejection.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Whitelist store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to token errors
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Builds a `StoreUnavailable` error from any displayable cause
    pub fn store_unavailable(cause: impl std::fmt::Display) -> Self {
        DomainError::StoreUnavailable {
            message: cause.to_string(),
        }
    }

    /// Whether this error came from the whitelist store rather than the token
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, DomainError::StoreUnavailable { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
