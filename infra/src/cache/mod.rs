//! Cache module for the Redis-backed token whitelist
//!
//! This module provides the Redis client with retry logic and the
//! `WhitelistStore` implementation built on it.

pub mod redis_client;
pub mod whitelist_store;


pub use redis_client::RedisClient;
pub use whitelist_store::RedisWhitelistStore;

// Re-export commonly used types
pub use tw_shared::config::CacheConfig;
