//! Shared configuration types for the Tokenward server crates
//!
//! This crate provides the configuration surface used across all server modules:
//! - Token signing and whitelist configuration
//! - Redis connection configuration
//! - Environment detection and logging configuration

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, Environment, JwtConfig, LogFormat, LoggingConfig,
    WhitelistConfig,
};
