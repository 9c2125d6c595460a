//! Whitelist store trait defining the interface for revocable token tracking.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DomainError;

/// Namespace prepended to a subject to address its whitelist entry
pub const DEFAULT_KEY_PREFIX: &str = "tokens:user:";

/// Builds the store key for a subject's whitelist entry
///
/// Every subject gets its own key under `prefix`, so no whitelist state is
/// shared between subjects.
pub fn whitelist_key(prefix: &str, subject: &str) -> String {
    format!("{}{}", prefix, subject)
}

/// Store trait for the per-subject token whitelist
///
/// Each subject owns one entry: an ordered `token_id -> expires_at`
/// collection plus a coarse expiration on the whole entry equal to the latest
/// live `expires_at`. Timestamps are Unix seconds.
///
/// # Errors
/// Every method fails only with `DomainError::StoreUnavailable` when the
/// backend cannot complete the operation. Absence is never an error.
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    /// Record a newly issued token
    ///
    /// Runs as one atomic unit:
    /// 1. insert or update the `token_id -> expires_at` member
    /// 2. remove every member whose `expires_at` is before now
    /// 3. set the entry's coarse expiration to the latest remaining
    ///    `expires_at`, read after steps 1 and 2
    ///
    /// # Example
    /// ```no_run
    /// # use tw_core::repositories::WhitelistStore;
    /// # async fn example(store: &impl WhitelistStore) -> Result<(), Box<dyn std::error::Error>> {
    /// store.add("u42", "0b5c1a4e-token-id", 1_700_003_600).await?;
    /// assert!(store.contains("u42", "0b5c1a4e-token-id").await?);
    /// # Ok(())
    /// # }
    /// ```
    async fn add(&self, subject: &str, token_id: &str, expires_at: i64) -> Result<(), DomainError>;

    /// Remove a single token from a subject's entry
    ///
    /// # Returns
    /// * `Ok(true)` - The token was a member and has been removed
    /// * `Ok(false)` - The token was not a member
    async fn remove(&self, subject: &str, token_id: &str) -> Result<bool, DomainError>;

    /// Check whether a token is a member of a subject's entry
    ///
    /// Read-only: no pruning happens here. An entry whose coarse expiration
    /// has elapsed counts as absent.
    async fn contains(&self, subject: &str, token_id: &str) -> Result<bool, DomainError>;

    /// Delete a subject's whole entry, revoking all of its tokens
    ///
    /// # Returns
    /// * `Ok(true)` - An entry existed and was deleted
    /// * `Ok(false)` - The subject had no entry
    async fn revoke_all(&self, subject: &str) -> Result<bool, DomainError>;
}

#[async_trait]
impl<T: WhitelistStore + ?Sized> WhitelistStore for Arc<T> {
    async fn add(&self, subject: &str, token_id: &str, expires_at: i64) -> Result<(), DomainError> {
        (**self).add(subject, token_id, expires_at).await
    }

    async fn remove(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        (**self).remove(subject, token_id).await
    }

    async fn contains(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        (**self).contains(subject, token_id).await
    }

    async fn revoke_all(&self, subject: &str) -> Result<bool, DomainError> {
        (**self).revoke_all(subject).await
    }
}
