//! In-process implementation of WhitelistStore
//!
//! Mirrors the Redis sorted-set semantics: a member map per subject key, a
//! coarse expiration per key, and pruning only on `add`. The write lock is
//! held for the whole `add` so the latest expiry is always read from
//! post-insert state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::errors::DomainError;

use super::r#trait::{whitelist_key, WhitelistStore, DEFAULT_KEY_PREFIX};

#[derive(Debug, Default)]
struct WhitelistEntry {
    members: BTreeMap<String, i64>,
    expires_at: Option<i64>,
}

impl WhitelistEntry {
    fn is_live_at(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }

    /// Whether the key would already be gone at `now`
    ///
    /// A key expiring at `t` still exists during second `t`, so writes keep
    /// it until strictly after its expiration.
    fn has_lapsed_at(&self, now: i64) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at < now)
    }
}

/// Whitelist store kept in process memory
pub struct InMemoryWhitelistStore {
    entries: RwLock<HashMap<String, WhitelistEntry>>,
    key_prefix: String,
    clock: Arc<dyn Clock>,
}

impl InMemoryWhitelistStore {
    /// Create a store driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store driven by `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            clock,
        }
    }

    /// Replace the key namespace
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    fn key(&self, subject: &str) -> String {
        whitelist_key(&self.key_prefix, subject)
    }

    /// Coarse expiration of a subject's entry, `None` if it has no live entry
    pub async fn expiration(&self, subject: &str) -> Option<i64> {
        let now = self.clock.now_secs();
        let entries = self.entries.read().await;
        entries
            .get(&self.key(subject))
            .filter(|entry| entry.is_live_at(now))
            .and_then(|entry| entry.expires_at)
    }

    /// Members of a subject's live entry ordered by expiry
    pub async fn members(&self, subject: &str) -> Vec<(String, i64)> {
        let now = self.clock.now_secs();
        let entries = self.entries.read().await;
        let mut members: Vec<(String, i64)> = entries
            .get(&self.key(subject))
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| {
                entry
                    .members
                    .iter()
                    .map(|(token_id, expires_at)| (token_id.clone(), *expires_at))
                    .collect()
            })
            .unwrap_or_default();
        members.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        members
    }

    /// Keys currently held, live or not
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryWhitelistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhitelistStore for InMemoryWhitelistStore {
    async fn add(&self, subject: &str, token_id: &str, expires_at: i64) -> Result<(), DomainError> {
        let now = self.clock.now_secs();
        let key = self.key(subject);
        let mut entries = self.entries.write().await;

        let entry = entries.entry(key.clone()).or_default();
        if entry.has_lapsed_at(now) {
            *entry = WhitelistEntry::default();
        }

        entry.members.insert(token_id.to_string(), expires_at);
        entry.members.retain(|_, member_expiry| *member_expiry >= now);

        let latest = entry.members.values().copied().max();
        match latest {
            Some(latest) if latest > now => entry.expires_at = Some(latest),
            // An expiration at or before now deletes the key outright
            _ => {
                entries.remove(&key);
            }
        }

        Ok(())
    }

    async fn remove(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        let now = self.clock.now_secs();
        let key = self.key(subject);
        let mut entries = self.entries.write().await;

        let Some(entry) = entries.get_mut(&key) else {
            return Ok(false);
        };

        if !entry.is_live_at(now) {
            entries.remove(&key);
            return Ok(false);
        }

        let removed = entry.members.remove(token_id).is_some();
        if entry.members.is_empty() {
            entries.remove(&key);
        }

        Ok(removed)
    }

    async fn contains(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        let now = self.clock.now_secs();
        let entries = self.entries.read().await;

        Ok(entries
            .get(&self.key(subject))
            .filter(|entry| entry.is_live_at(now))
            .map_or(false, |entry| entry.members.contains_key(token_id)))
    }

    async fn revoke_all(&self, subject: &str) -> Result<bool, DomainError> {
        let now = self.clock.now_secs();
        let mut entries = self.entries.write().await;

        Ok(entries
            .remove(&self.key(subject))
            .map_or(false, |entry| entry.is_live_at(now)))
    }
}
