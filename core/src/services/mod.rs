//! Business services containing token and authentication logic.

pub mod authentication;
pub mod token;

// Re-export commonly used types
pub use authentication::AuthenticationService;
pub use token::{TokenService, TokenServiceConfig};
