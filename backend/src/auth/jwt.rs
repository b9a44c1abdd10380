//! Access token issuance and validation
//!
//! Access tokens are HS256 JWTs carrying the user id in `sub`. They are
//! validated purely from the signature and the expiry, no storage lookup.
//! Keys are pre-computed once at startup and shared through `Arc`.

use super::clock::Clock;
use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Why an access token was refused
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature or algorithm is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token claims are malformed")]
    MalformedClaims,
}

/// Pre-computed JWT keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
        }
    }
}

/// Signs and validates access tokens
///
/// Immutable after construction. Building a codec with another secret is the
/// key rotation story: everything signed by the old key stops validating.
#[derive(Clone)]
pub struct TokenCodec {
    keys: JwtKeys,
    validation: Arc<Validation>,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `validate`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: JwtKeys::new(secret),
            validation: Arc::new(validation),
            clock,
        }
    }

    /// Issue a signed token for `user_id` valid for `ttl` from now
    pub fn issue(&self, user_id: i64, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
    }

    /// Validate a token and return the user id it was issued for
    pub fn validate(&self, token: &str) -> Result<i64, TokenError> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::MalformedClaims,
            })?;

        let claims = token_data.claims;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::MalformedClaims)
    }
}
