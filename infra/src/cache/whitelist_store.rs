//! Redis-backed token whitelist
//!
//! Each subject's entry is a sorted set at `key_prefix + subject`. Members are
//! token IDs scored by their expiry in Unix seconds, and the key itself
//! expires (`EXPIREAT`) at the highest live score.

use std::sync::Arc;

use async_trait::async_trait;
use redis::Script;
use tracing::{debug, warn};

use tw_core::clock::{Clock, SystemClock};
use tw_core::errors::DomainError;
use tw_core::repositories::{whitelist_key, WhitelistStore, DEFAULT_KEY_PREFIX};
use tw_shared::config::WhitelistConfig;

use super::redis_client::RedisClient;

/// Insert, prune and re-expire in one server-side step.
///
/// KEYS[1] = entry key, ARGV[1] = token id, ARGV[2] = expires_at,
/// ARGV[3] = now. Returns the new key expiration, or 0 when the key was
/// dropped because nothing in it outlives `now`.
const ADD_TOKEN_SCRIPT: &str = r#"
redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', '(' .. ARGV[3])
local latest = redis.call('ZRANGE', KEYS[1], -1, -1, 'WITHSCORES')
if latest[2] == nil or tonumber(latest[2]) <= tonumber(ARGV[3]) then
  redis.call('DEL', KEYS[1])
  return 0
end
redis.call('EXPIREAT', KEYS[1], latest[2])
return tonumber(latest[2])
"#;

/// Whitelist store keeping one Redis sorted set per subject
///
/// `add` is atomic on the server, so concurrent issuances for one subject
/// never lose a member or shorten the key's lifetime.
#[derive(Clone)]
pub struct RedisWhitelistStore {
    client: RedisClient,
    key_prefix: String,
    clock: Arc<dyn Clock>,
    add_script: Script,
}

impl RedisWhitelistStore {
    /// Create a store using the default key prefix and the system clock
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            clock: Arc::new(SystemClock),
            add_script: Script::new(ADD_TOKEN_SCRIPT),
        }
    }

    /// Create a store from whitelist configuration
    pub fn from_config(client: RedisClient, config: &WhitelistConfig) -> Self {
        Self::new(client).with_key_prefix(config.key_prefix.clone())
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Use `clock` for the prune cutoff passed to the server
    ///
    /// Key expiry itself is always judged by the Redis server's clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    /// Store key of a subject's entry
    pub fn key(&self, subject: &str) -> String {
        whitelist_key(&self.key_prefix, subject)
    }

    /// Members of a subject's entry as `(token_id, expires_at)`, earliest first
    pub async fn members(&self, subject: &str) -> Result<Vec<(String, i64)>, DomainError> {
        Ok(self.client.zrange_with_scores(&self.key(subject)).await?)
    }

    /// Seconds until a subject's entry expires, `None` if it has no entry
    pub async fn time_to_live(&self, subject: &str) -> Result<Option<i64>, DomainError> {
        Ok(self.client.ttl(&self.key(subject)).await?)
    }
}

#[async_trait]
impl WhitelistStore for RedisWhitelistStore {
    async fn add(&self, subject: &str, token_id: &str, expires_at: i64) -> Result<(), DomainError> {
        let key = self.key(subject);
        let now = self.clock.now_secs();
        let args = [token_id.to_string(), expires_at.to_string(), now.to_string()];

        let entry_expiry: i64 = self
            .client
            .invoke_script(&self.add_script, &[key.as_str()], &args)
            .await?;

        if entry_expiry == 0 {
            warn!(
                "Whitelist entry for subject {} dropped on add: token {} expires at {}",
                subject, token_id, expires_at
            );
        } else {
            debug!(
                "Whitelisted token {} for subject {}, entry expires at {}",
                token_id, subject, entry_expiry
            );
        }

        Ok(())
    }

    async fn remove(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        let removed = self.client.zrem(&self.key(subject), token_id).await?;

        debug!(
            "Removal of token {} for subject {}: {}",
            token_id, subject, removed
        );
        Ok(removed)
    }

    async fn contains(&self, subject: &str, token_id: &str) -> Result<bool, DomainError> {
        let score = self.client.zscore(&self.key(subject), token_id).await?;

        Ok(score.is_some())
    }

    async fn revoke_all(&self, subject: &str) -> Result<bool, DomainError> {
        Ok(self.client.delete(&self.key(subject)).await?)
    }
}
