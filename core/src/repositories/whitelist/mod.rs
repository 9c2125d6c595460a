pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod memory;

pub use memory::InMemoryWhitelistStore;
pub use r#trait::{whitelist_key, WhitelistStore, DEFAULT_KEY_PREFIX};
