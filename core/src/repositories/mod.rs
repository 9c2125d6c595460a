pub mod whitelist;

pub use whitelist::{whitelist_key, InMemoryWhitelistStore, WhitelistStore, DEFAULT_KEY_PREFIX};
