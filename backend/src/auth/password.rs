//! Password hashing using argon2
//!
//! Provides secure password hashing and verification.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Async callers go through
//! [`PasswordService::hash_async`] / [`PasswordService::verify_async`], which
//! move the work onto the blocking thread pool.

use crate::config::Argon2Config;
use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Credential hashing failures
///
/// A wrong password is not an error, see [`PasswordService::verify`].
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(password_hash::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(password_hash::Error),

    #[error("Invalid argon2 parameters: {0}")]
    InvalidParams(argon2::Error),

    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Password hashing service
///
/// Uses Argon2id with tunable memory/iteration/parallelism cost. Cheap to
/// clone; the parameters are plain values.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(config: &Argon2Config) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(PasswordError::InvalidParams)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt (blocking operation)
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::Hashing)?;
        Ok(hash.to_string())
    }

    /// Verify a password against a PHC-format hash (blocking operation)
    ///
    /// Returns `Ok(false)` for a mismatch. A hash that cannot be parsed is
    /// reported as [`PasswordError::MalformedHash`].
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(PasswordError::MalformedHash)?;
        // Cost parameters are read from the hash itself.
        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hashing(e)),
        }
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(&self, password: String) -> Result<String, PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&password)).await?
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(
        &self,
        hash: String,
        password: String,
    ) -> Result<bool, PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&hash, &password)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> PasswordService {
        PasswordService::new(&Argon2Config {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = test_service();
        let password = "secure_password_123";
        let hash = service.hash(password).unwrap();

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify(&hash, password).unwrap());
        assert!(!service.verify(&hash, "wrong_password").unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let service = test_service();
        let hash1 = service.hash("test_password").unwrap();
        let hash2 = service.hash("test_password").unwrap();

        // Random salt
        assert_ne!(hash1, hash2);
        assert!(service.verify(&hash1, "test_password").unwrap());
        assert!(service.verify(&hash2, "test_password").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_hard_failure() {
        let service = test_service();
        let result = service.verify("not-a-phc-string", "whatever");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn test_hash_from_other_cost_still_verifies() {
        let strong = PasswordService::new(&Argon2Config {
            memory_kib: 512,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash("password123").unwrap();
        assert!(test_service().verify(&hash, "password123").unwrap());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordService::new(&Argon2Config {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let service = test_service();
        let hash = service
            .hash_async("async_test_password".to_string())
            .await
            .unwrap();

        assert!(service
            .verify_async(hash.clone(), "async_test_password".to_string())
            .await
            .unwrap());
        assert!(!service
            .verify_async(hash, "wrong".to_string())
            .await
            .unwrap());
    }
}
