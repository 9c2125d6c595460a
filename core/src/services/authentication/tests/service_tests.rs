//! Unit tests for the authentication service

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;

use crate::clock::ManualClock;
use crate::domain::entities::token::Token;
use crate::errors::{DomainError, TokenError};
use crate::repositories::{InMemoryWhitelistStore, WhitelistStore};
use crate::services::authentication::AuthenticationService;
use crate::services::token::{TokenService, TokenServiceConfig};

use super::mocks::UnavailableWhitelistStore;

const NOW: i64 = 1_700_000_000;

type MemoryService = AuthenticationService<Arc<InMemoryWhitelistStore>>;

fn token_service(clock: Arc<ManualClock>) -> TokenService {
    TokenService::with_clock(TokenServiceConfig::default(), clock)
        .expect("Failed to create token service")
}

fn create_test_service() -> (MemoryService, Arc<InMemoryWhitelistStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let store = Arc::new(InMemoryWhitelistStore::with_clock(clock.clone()));
    let service = AuthenticationService::new(token_service(clock.clone()), store.clone());
    (service, store, clock)
}

fn unavailable_service(clock: Arc<ManualClock>) -> AuthenticationService<UnavailableWhitelistStore> {
    AuthenticationService::new(token_service(clock), UnavailableWhitelistStore)
}

#[tokio::test]
async fn test_tokenize_then_verify_returns_subject() {
    let (service, store, _clock) = create_test_service();

    let token = service.tokenize("alice").await.unwrap();

    assert_eq!(service.verify(&token).await.unwrap(), Some("alice".to_string()));

    let decoded = Token::decode(&token).unwrap();
    assert!(store.contains("alice", decoded.token_id()).await.unwrap());
    assert_eq!(decoded.expires_at(), NOW + 3600);
}

#[tokio::test]
async fn test_deauthorize_revokes_outstanding_token() {
    let (service, _store, _clock) = create_test_service();

    let token = service.tokenize("u42").await.unwrap();
    assert_eq!(service.verify(&token).await.unwrap(), Some("u42".to_string()));

    service.deauthorize("u42").await.unwrap();

    assert_eq!(service.verify(&token).await.unwrap(), None);
}

#[tokio::test]
async fn test_deauthorize_revokes_every_token_of_subject_only() {
    let (service, _store, _clock) = create_test_service();

    let first = service.tokenize("u1").await.unwrap();
    let second = service.tokenize("u1").await.unwrap();
    let other = service.tokenize("u2").await.unwrap();

    service.deauthorize("u1").await.unwrap();

    assert_eq!(service.verify(&first).await.unwrap(), None);
    assert_eq!(service.verify(&second).await.unwrap(), None);
    assert_eq!(service.verify(&other).await.unwrap(), Some("u2".to_string()));
}

#[tokio::test]
async fn test_deauthorize_without_tokens_succeeds() {
    let (service, _store, _clock) = create_test_service();

    service.deauthorize("never-logged-in").await.unwrap();
    service.deauthorize("never-logged-in").await.unwrap();
}

#[tokio::test]
async fn test_revoke_single_token_keeps_the_other() {
    let (service, _store, _clock) = create_test_service();

    let t1 = service.tokenize("u7").await.unwrap();
    let t2 = service.tokenize("u7").await.unwrap();

    assert!(service.revoke(&t1).await.unwrap());

    assert_eq!(service.verify(&t1).await.unwrap(), None);
    assert_eq!(service.verify(&t2).await.unwrap(), Some("u7".to_string()));

    // Already revoked
    assert!(!service.revoke(&t1).await.unwrap());
}

#[tokio::test]
async fn test_store_level_remove_revokes_single_token() {
    let (service, store, _clock) = create_test_service();

    let t1 = service.tokenize("u7").await.unwrap();
    let t2 = service.tokenize("u7").await.unwrap();

    let t1_id = Token::decode(&t1).unwrap().token_id().to_string();
    assert!(store.remove("u7", &t1_id).await.unwrap());

    assert_eq!(service.verify(&t1).await.unwrap(), None);
    assert_eq!(service.verify(&t2).await.unwrap(), Some("u7".to_string()));
}

#[tokio::test]
async fn test_revoke_ignores_rejected_tokens() {
    let (service, _store, _clock) = create_test_service();

    assert!(!service.revoke("not-a-token").await.unwrap());
}

#[tokio::test]
async fn test_second_token_does_not_invalidate_first() {
    let (service, _store, _clock) = create_test_service();

    let first = service.tokenize("u1").await.unwrap();
    let second = service.tokenize("u1").await.unwrap();

    assert_ne!(first, second);
    assert_eq!(service.verify(&first).await.unwrap(), Some("u1".to_string()));
    assert_eq!(service.verify(&second).await.unwrap(), Some("u1".to_string()));
}

#[tokio::test]
async fn test_verify_expiry_boundary() {
    let (service, _store, clock) = create_test_service();

    let token = service.tokenize("u1").await.unwrap();
    let expires_at = Token::decode(&token).unwrap().expires_at();

    clock.set(expires_at - 1);
    assert_eq!(service.verify(&token).await.unwrap(), Some("u1".to_string()));

    clock.set(expires_at + 1);
    assert_eq!(service.verify(&token).await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_token_is_not_resurrected_by_lingering_member() {
    let (service, store, clock) = create_test_service();

    let token = service.tokenize("u1").await.unwrap();
    let decoded = Token::decode(&token).unwrap();

    // Keep the entry alive past the first token's expiry with a longer token
    clock.advance(1800);
    service.tokenize("u1").await.unwrap();
    clock.set(decoded.expires_at() + 10);

    assert!(store.contains("u1", decoded.token_id()).await.unwrap());
    assert_eq!(service.verify(&token).await.unwrap(), None);
    assert!(matches!(
        service.authenticate(&token).await,
        Err(DomainError::Token(TokenError::Expired))
    ));
}

#[tokio::test]
async fn test_flipping_any_signature_bit_rejects_token() {
    let (service, _store, _clock) = create_test_service();

    let token = service.tokenize("u1").await.unwrap();
    let (signing_input, signature) = token.rsplit_once('.').unwrap();
    let signature_bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();

    for byte in 0..signature_bytes.len() {
        for bit in 0..8 {
            let mut tampered = signature_bytes.clone();
            tampered[byte] ^= 1 << bit;
            let forged = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(&tampered));

            assert_eq!(
                service.verify(&forged).await.unwrap(),
                None,
                "bit {} of byte {} was not detected",
                bit,
                byte
            );
        }
    }

    assert_eq!(service.verify(&token).await.unwrap(), Some("u1".to_string()));
}

#[tokio::test]
async fn test_verify_rejects_malformed_tokens() {
    let (service, _store, _clock) = create_test_service();

    for raw in ["", "Bearer", "a.b", "a.b.c", "a.b.c.d", "...."] {
        assert_eq!(service.verify(raw).await.unwrap(), None, "accepted {:?}", raw);
    }
}

#[tokio::test]
async fn test_whitelisted_but_forged_token_is_rejected() {
    let (service, store, clock) = create_test_service();

    let foreign = TokenService::with_clock(
        TokenServiceConfig {
            jwt_secret: "attacker-secret".to_string(),
            ..Default::default()
        },
        clock,
    )
    .unwrap();
    let forged = foreign.issue("u1", Duration::seconds(3600)).unwrap();

    store
        .add(forged.subject(), forged.token_id(), forged.expires_at())
        .await
        .unwrap();

    assert_eq!(service.verify(&forged.encode()).await.unwrap(), None);
    assert!(matches!(
        service.authenticate(&forged.encode()).await,
        Err(DomainError::Token(TokenError::InvalidSignature))
    ));
}

#[tokio::test]
async fn test_authentic_but_unlisted_token_is_rejected() {
    let (service, _store, _clock) = create_test_service();

    let unlisted = service
        .token_service()
        .issue("u1", Duration::seconds(3600))
        .unwrap();

    assert_eq!(service.verify(&unlisted.encode()).await.unwrap(), None);
    assert!(matches!(
        service.authenticate(&unlisted.encode()).await,
        Err(DomainError::Token(TokenError::NotWhitelisted))
    ));
}

#[tokio::test]
async fn test_authenticate_reports_malformed_token() {
    let (service, _store, _clock) = create_test_service();

    assert!(matches!(
        service.authenticate("garbage").await,
        Err(DomainError::Token(TokenError::MalformedToken))
    ));
}

#[tokio::test]
async fn test_tokenize_fails_when_store_unavailable() {
    let clock = Arc::new(ManualClock::new(NOW));
    let service = unavailable_service(clock);

    let result = service.tokenize("u1").await;
    assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
}

#[tokio::test]
async fn test_verify_surfaces_store_outage() {
    let (healthy, _store, clock) = create_test_service();
    let token = healthy.tokenize("u1").await.unwrap();

    let degraded = unavailable_service(clock);

    let result = degraded.verify(&token).await;
    assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
}

#[tokio::test]
async fn test_verify_rejects_malformed_token_without_store() {
    let clock = Arc::new(ManualClock::new(NOW));
    let degraded = unavailable_service(clock);

    assert_eq!(degraded.verify("garbage").await.unwrap(), None);
}

#[tokio::test]
async fn test_deauthorize_surfaces_store_outage() {
    let clock = Arc::new(ManualClock::new(NOW));
    let degraded = unavailable_service(clock);

    let result = degraded.deauthorize("u1").await;
    assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
}

#[tokio::test]
async fn test_tokenize_rejects_empty_subject() {
    let (service, store, _clock) = create_test_service();

    let result = service.tokenize("").await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(store.keys().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tokenize_for_same_subject() {
    let (service, store, _clock) = create_test_service();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.tokenize("u1").await.unwrap() })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(store.members("u1").await.len(), 20);
    for token in &tokens {
        assert_eq!(service.verify(token).await.unwrap(), Some("u1".to_string()));
    }
}
