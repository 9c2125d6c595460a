//! Domain entities representing core authentication objects.

pub mod token;


// Re-export commonly used types
pub use token::{Claims, Token};
