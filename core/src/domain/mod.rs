//! Domain layer containing the token entity.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
