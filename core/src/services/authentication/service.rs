//! Authentication service implementation

use tracing::{debug, error, info};

use crate::domain::entities::token::Token;
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::WhitelistStore;
use crate::services::token::TokenService;

/// Issues, verifies and revokes whitelisted tokens
///
/// Stateless apart from its injected collaborators, so a single instance can
/// be shared across tasks behind an `Arc`.
///
/// A token is accepted only when it is cryptographically valid (signature
/// matches, not expired) **and** its token ID is in its subject's whitelist
/// entry. Either condition alone is not enough.
pub struct AuthenticationService<W: WhitelistStore> {
    tokens: TokenService,
    whitelist: W,
}

impl<W: WhitelistStore> AuthenticationService<W> {
    /// Creates a new authentication service
    ///
    /// # Arguments
    ///
    /// * `tokens` - Token signer and validator
    /// * `whitelist` - Store tracking which issued tokens are still valid
    pub fn new(tokens: TokenService, whitelist: W) -> Self {
        Self { tokens, whitelist }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    pub fn whitelist(&self) -> &W {
        &self.whitelist
    }

    /// Issues a token for `subject` and registers it in the whitelist
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The encoded token
    /// * `Err(DomainError::StoreUnavailable)` - The whitelist write failed; no
    ///   token is handed out
    /// * `Err(DomainError::Validation)` - Empty subject
    pub async fn tokenize(&self, subject: &str) -> DomainResult<String> {
        let token = self
            .tokens
            .issue(subject, self.tokens.config().token_ttl())?;

        self.whitelist
            .add(token.subject(), token.token_id(), token.expires_at())
            .await
            .map_err(|e| {
                error!("Failed to whitelist token for subject {}: {}", subject, e);
                e
            })?;

        info!(
            "Issued whitelisted token {} for subject {}",
            token.token_id(),
            subject
        );

        Ok(token.encode())
    }

    /// Verifies a presented token and returns its subject
    ///
    /// Malformed, forged, expired and non-whitelisted tokens all yield
    /// `Ok(None)`; the reason is only logged. A store failure is returned as
    /// `Err(DomainError::StoreUnavailable)` and must not be treated as a
    /// rejection by the caller.
    pub async fn verify(&self, token: &str) -> DomainResult<Option<String>> {
        match self.authenticate(token).await {
            Ok(token) => Ok(Some(token.subject().to_string())),
            Err(DomainError::Token(reason)) => {
                debug!("Rejected token: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Revokes every outstanding token for `subject`
    ///
    /// Idempotent; a subject without tokens is not an error. Ordering against
    /// a concurrent `tokenize` for the same subject is not defined: a token
    /// issued while this call is in flight may survive it.
    pub async fn deauthorize(&self, subject: &str) -> DomainResult<()> {
        let removed = self.whitelist.revoke_all(subject).await?;

        if removed {
            info!("Deauthorized subject {}", subject);
        } else {
            debug!("Deauthorize for subject {} found no whitelist entry", subject);
        }

        Ok(())
    }

    /// Revokes the single token presented
    ///
    /// Only an authentic, unexpired token can revoke itself; anything else
    /// returns `Ok(false)` without touching the store.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The token was whitelisted and has been removed
    /// * `Ok(false)` - Not authentic, expired, or already revoked
    pub async fn revoke(&self, token: &str) -> DomainResult<bool> {
        let token = match self.tokens.parse(token) {
            Ok(token) => token,
            Err(reason) => {
                debug!("Ignoring revocation of rejected token: {}", reason);
                return Ok(false);
            }
        };

        let removed = self
            .whitelist
            .remove(token.subject(), token.token_id())
            .await?;

        if removed {
            info!(
                "Revoked token {} for subject {}",
                token.token_id(),
                token.subject()
            );
        }

        Ok(removed)
    }

    /// Full verification pipeline with the rejection reason kept
    pub(crate) async fn authenticate(&self, token: &str) -> DomainResult<Token> {
        let token = self.tokens.parse(token)?;

        if !self
            .whitelist
            .contains(token.subject(), token.token_id())
            .await?
        {
            return Err(TokenError::NotWhitelisted.into());
        }

        Ok(token)
    }
}
