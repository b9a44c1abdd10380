//! Authentication failure kinds
//!
//! Callers branch on the variant. The HTTP layer collapses the
//! authentication-failure variants into one generic response, see
//! `crate::error`.

use super::password::PasswordError;
use crate::repositories::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User with this login already exists")]
    DuplicateLogin,

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    #[error("Refresh token has expired")]
    RefreshTokenExpired,

    #[error("Refresh token rotation failed: {0}")]
    RotationFailed(#[source] StoreError),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Entropy source failure: {0}")]
    Entropy(#[from] rand::Error),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Failures that must reach the client only as a generic 401
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::InvalidOrExpiredRefreshToken
                | AuthError::RefreshTokenExpired
                | AuthError::RotationFailed(_)
                | AuthError::Unauthenticated
        )
    }
}
