//! Token entity for whitelisted bearer authentication.
//!
//! The wire form is the JWT compact serialization: three base64url segments
//! (`header.payload.signature`). A decoded [`Token`] keeps the signing input
//! exactly as received, so signature checks run over the presented bytes and
//! never over a re-serialization.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, Header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TokenError;

/// Separator between segments of the compact wire form
const SEGMENT_SEPARATOR: char = '.';

/// Claims structure for the token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Token ID, the whitelist member key
    pub jti: String,
}

impl Claims {
    /// Creates claims with a fresh random token ID
    pub fn new(subject: impl Into<String>, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: subject.into(),
            iat: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired at `now`
    ///
    /// A token is live strictly before `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Signed, time-limited credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    algorithm: Algorithm,
    claims: Claims,
    signing_input: String,
    signature: String,
}

impl Token {
    pub(crate) fn from_parts(
        algorithm: Algorithm,
        claims: Claims,
        signing_input: String,
        signature: String,
    ) -> Self {
        Self {
            algorithm,
            claims,
            signing_input,
            signature,
        }
    }

    /// Builds the `header.payload` input the signature is computed over
    pub(crate) fn signing_input_for(header: &Header, claims: &Claims) -> Result<String, TokenError> {
        let header = serde_json::to_vec(header).map_err(|_| TokenError::SigningFailed)?;
        let claims = serde_json::to_vec(claims).map_err(|_| TokenError::SigningFailed)?;

        Ok(format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(header),
            SEGMENT_SEPARATOR,
            URL_SAFE_NO_PAD.encode(claims)
        ))
    }

    /// Parses the wire form into a token
    ///
    /// Only the structure is checked here: three non-empty base64url
    /// segments, a JSON header naming a known algorithm and a JSON payload
    /// carrying every claim. The signature is not verified.
    ///
    /// # Errors
    ///
    /// * `TokenError::MalformedToken` - the string does not parse
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let mut segments = raw.split(SEGMENT_SEPARATOR);
        let (header_segment, payload_segment, signature) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                (header, payload, signature)
            }
            _ => return Err(TokenError::MalformedToken),
        };

        let header: Header = decode_segment(header_segment)?;
        let claims: Claims = decode_segment(payload_segment)?;
        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::MalformedToken)?;

        let signing_input_len = header_segment.len() + 1 + payload_segment.len();

        Ok(Self {
            algorithm: header.alg,
            claims,
            signing_input: raw[..signing_input_len].to_string(),
            signature: signature.to_string(),
        })
    }

    /// Serializes the token into its wire form
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.signing_input, SEGMENT_SEPARATOR, self.signature)
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }

    pub fn issued_at(&self) -> i64 {
        self.claims.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// Expiry as a UTC timestamp, `None` if out of chrono's range
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.claims.exp, 0).single()
    }

    /// Algorithm named in the token header
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Base64url signature segment
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub(crate) fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Checks if the token has expired at `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.claims.is_expired_at(now)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::MalformedToken)
}
