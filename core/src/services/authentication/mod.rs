//! Authentication service module
//!
//! Ties token issuance and validation to the whitelist store:
//! - `tokenize` issues a token and registers it
//! - `verify` accepts a token only if it is authentic, live and whitelisted
//! - `deauthorize` and `revoke` withdraw tokens before they expire

mod service;

#[cfg(test)]
mod tests;

pub use service::AuthenticationService;
