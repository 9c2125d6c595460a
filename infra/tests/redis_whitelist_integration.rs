//! Integration tests for the Redis-backed token whitelist
//!
//! These tests require a running Redis instance to execute.
//! Run with: cargo test -p tw_infra --test redis_whitelist_integration -- --ignored

use std::sync::Arc;

use rand::Rng;
use tw_core::clock::{Clock, ManualClock};
use tw_core::domain::entities::Token;
use tw_core::repositories::WhitelistStore;
use tw_core::services::{AuthenticationService, TokenService, TokenServiceConfig};
use tw_infra::cache::{CacheConfig, RedisClient, RedisWhitelistStore};

fn redis_config() -> CacheConfig {
    CacheConfig::new(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    )
}

/// Random subject so concurrent runs never share an entry
fn unique_subject(prefix: &str) -> String {
    format!("{}-{}", prefix, rand::thread_rng().gen::<u64>())
}

async fn create_store() -> RedisWhitelistStore {
    let client = RedisClient::new(redis_config())
        .await
        .expect("Failed to connect to Redis");
    RedisWhitelistStore::new(client).with_key_prefix("test:tokens:user:")
}

async fn create_service() -> AuthenticationService<RedisWhitelistStore> {
    let tokens = TokenService::new(TokenServiceConfig::default()).unwrap();
    AuthenticationService::new(tokens, create_store().await)
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_tokenize_verify_deauthorize() {
    let service = create_service().await;
    let subject = unique_subject("u42");

    let token = service.tokenize(&subject).await.unwrap();
    assert_eq!(service.verify(&token).await.unwrap(), Some(subject.clone()));

    service.deauthorize(&subject).await.unwrap();
    assert_eq!(service.verify(&token).await.unwrap(), None);

    // Idempotent
    service.deauthorize(&subject).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_revoke_single_token() {
    let service = create_service().await;
    let subject = unique_subject("u7");

    let t1 = service.tokenize(&subject).await.unwrap();
    let t2 = service.tokenize(&subject).await.unwrap();

    assert!(service.revoke(&t1).await.unwrap());

    assert_eq!(service.verify(&t1).await.unwrap(), None);
    assert_eq!(service.verify(&t2).await.unwrap(), Some(subject.clone()));

    service.deauthorize(&subject).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_entry_expires_with_latest_token() {
    let service = create_service().await;
    let subject = unique_subject("ttl");

    let token = service.tokenize(&subject).await.unwrap();
    let expires_at = Token::decode(&token).unwrap().expires_at();

    let ttl = service
        .whitelist()
        .time_to_live(&subject)
        .await
        .unwrap()
        .expect("Whitelist entry should carry an expiry");
    let remaining = expires_at - service.token_service().now();
    assert!(ttl <= remaining && ttl >= remaining - 5, "ttl {} vs {}", ttl, remaining);

    service.deauthorize(&subject).await.unwrap();
    assert_eq!(service.whitelist().time_to_live(&subject).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_add_prunes_expired_members() {
    let clock = Arc::new(ManualClock::starting_now());
    let store = create_store().await.with_clock(clock.clone());
    let subject = unique_subject("prune");
    let now = clock.now_secs();

    store.add(&subject, "short", now + 60).await.unwrap();
    store.add(&subject, "long", now + 3600).await.unwrap();

    // Pretend the short token has expired; the next add drops it
    clock.advance(120);
    store.add(&subject, "fresh", now + 1800).await.unwrap();

    let members: Vec<String> = store
        .members(&subject)
        .await
        .unwrap()
        .into_iter()
        .map(|(token_id, _)| token_id)
        .collect();
    assert_eq!(members, vec!["fresh".to_string(), "long".to_string()]);

    assert!(!store.contains(&subject, "short").await.unwrap());
    assert!(store.contains(&subject, "long").await.unwrap());

    // The entry keeps the latest expiry, not the last one added
    let ttl = store.time_to_live(&subject).await.unwrap().unwrap();
    assert!(ttl > 1800);

    assert!(store.revoke_all(&subject).await.unwrap());
    assert!(!store.revoke_all(&subject).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_add_of_already_expired_token_leaves_no_entry() {
    let clock = Arc::new(ManualClock::starting_now());
    let store = create_store().await.with_clock(clock.clone());
    let subject = unique_subject("stale");

    store.add(&subject, "stale", clock.now_secs() - 1).await.unwrap();

    assert!(!store.contains(&subject, "stale").await.unwrap());
    assert!(!store.client().exists(&store.key(&subject)).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_concurrent_tokenize_keeps_every_token() {
    let service = Arc::new(create_service().await);
    let subject = unique_subject("burst");

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let service = service.clone();
            let subject = subject.clone();
            tokio::spawn(async move { service.tokenize(&subject).await.unwrap() })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(service.whitelist().members(&subject).await.unwrap().len(), 25);
    for token in &tokens {
        assert_eq!(service.verify(token).await.unwrap(), Some(subject.clone()));
    }

    service.deauthorize(&subject).await.unwrap();
}
