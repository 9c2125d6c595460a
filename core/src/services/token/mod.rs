//! Token service module for signed bearer tokens
//!
//! This module handles token issuance and cryptographic validation:
//! - Issuing tokens with a fresh token ID and bounded lifetime
//! - Signing the header and claims with an HMAC secret
//! - Validating signatures and expiry against an injected clock

mod config;
mod service;


pub use config::TokenServiceConfig;
pub use service::TokenService;
