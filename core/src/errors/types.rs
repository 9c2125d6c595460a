//! Token error types
//!
//! These errors describe why a presented token was not accepted. They are
//! meant for logs and tests; callers of the authentication service only ever
//! see an unauthenticated outcome.

use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token not whitelisted")]
    NotWhitelisted,

    #[error("Token signing failed")]
    SigningFailed,
}
