//! # Tokenward Core
//!
//! Core authentication logic for Tokenward.
//! This crate contains the token entity, the whitelist store abstraction,
//! the signing and authentication services, and the error types that
//! tie them together. Concrete store backends live in the infrastructure crate.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
