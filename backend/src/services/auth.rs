//! Authentication service
//!
//! Owns the credential and session-token lifecycle: registration, login,
//! refresh token rotation, logout and access token validation.
//!
//! The service holds no mutable state of its own. Everything that must
//! survive between requests lives in the injected stores, and every store
//! call is bounded by the configured timeout.

use super::bounded;
use crate::auth::{
    generate_refresh_token, AuthError, Clock, PasswordService, TokenCodec, TokenError,
};
use crate::config::AppConfig;
use crate::repositories::{
    RefreshTokenRecord, RefreshTokenStore, StoreError, UniqueField, UserStore,
};
use chrono::Duration;
use secrecy::ExposeSecret;
use std::future::Future;
use std::sync::Arc;
use tasktrack_shared::types::{AuthTokens, UserProfile};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Lifetimes and limits applied by [`AuthService`]
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub store_timeout: std::time::Duration,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            access_token_ttl: Duration::seconds(config.jwt.access_token_expiry_secs),
            refresh_token_ttl: Duration::seconds(config.auth.refresh_token_expiry_secs),
            store_timeout: std::time::Duration::from_millis(config.auth.store_timeout_ms),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::hours(24),
            refresh_token_ttl: Duration::days(7),
            store_timeout: std::time::Duration::from_secs(5),
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    tokens: TokenCodec,
    passwords: PasswordService,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        tokens: TokenCodec,
        passwords: PasswordService,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            tokens,
            passwords,
            clock,
            settings,
        }
    }

    /// Build the service from configuration. Called once at startup.
    pub fn from_config(
        config: &AppConfig,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenCodec::new(
            config.jwt.secret.expose_secret().as_bytes(),
            clock.clone(),
        );
        let passwords = PasswordService::new(&config.auth.argon2)?;

        Ok(Self::new(
            users,
            refresh_tokens,
            tokens,
            passwords,
            clock,
            AuthSettings::from_config(config),
        ))
    }

    /// Register a new user. No tokens are issued; the client logs in next.
    pub async fn register(&self, login: &str, email: &str, password: &str) -> Result<i64, AuthError> {
        if self
            .bounded("users.find_by_login", self.users.find_by_login(login))
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateLogin);
        }
        if self
            .bounded("users.find_by_email", self.users.find_by_email(email))
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.passwords.hash_async(password.to_string()).await?;

        // The unique constraints still decide a registration race.
        let user = self
            .bounded("users.create", self.users.create(login, email, &password_hash))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(UniqueField::Login) => AuthError::DuplicateLogin,
                StoreError::Conflict(UniqueField::Email) => AuthError::DuplicateEmail,
                other => AuthError::Storage(other),
            })?;

        info!(user_id = user.id, "User registered");
        Ok(user.id)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, login: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = match self
            .bounded("users.find_by_login", self.users.find_by_login(login))
            .await?
        {
            Some(user) => user,
            None => {
                debug!("Login rejected: unknown login");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let valid = self
            .passwords
            .verify_async(user.password_hash, password.to_string())
            .await?;
        if !valid {
            debug!(user_id = user.id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(user.id, self.settings.access_token_ttl)?;
        let record = RefreshTokenRecord {
            token: generate_refresh_token()?,
            user_id: user.id,
            expires_at: self.clock.now() + self.settings.refresh_token_ttl,
        };

        // No access token leaves without its stored refresh token.
        self.bounded("refresh_tokens.save", self.refresh_tokens.save(&record))
            .await
            .map_err(|e| {
                error!(user_id = user.id, error = %e, "Failed to persist refresh token");
                AuthError::Storage(e)
            })?;

        info!(user_id = user.id, "User logged in");
        Ok(self.token_pair(access_token, record.token))
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// A successful call consumes the presented token; it never resolves
    /// again. A failed rotation leaves the store unchanged.
    pub async fn refresh(&self, presented: &str) -> Result<AuthTokens, AuthError> {
        let record = self
            .bounded("refresh_tokens.find", self.refresh_tokens.find(presented))
            .await?
            .ok_or(AuthError::InvalidOrExpiredRefreshToken)?;

        let now = self.clock.now();
        if record.is_expired_at(now) {
            // Best effort; the outcome is the same either way.
            if let Err(e) = self
                .bounded("refresh_tokens.delete", self.refresh_tokens.delete(presented))
                .await
            {
                warn!(user_id = record.user_id, error = %e, "Failed to delete expired refresh token");
            }
            debug!(user_id = record.user_id, "Refresh rejected: token expired");
            return Err(AuthError::RefreshTokenExpired);
        }

        let replacement = RefreshTokenRecord {
            token: generate_refresh_token()?,
            user_id: record.user_id,
            expires_at: now + self.settings.refresh_token_ttl,
        };

        let rotated = self
            .bounded(
                "refresh_tokens.rotate",
                self.refresh_tokens.rotate(presented, &replacement),
            )
            .await
            .map_err(|e| {
                error!(user_id = record.user_id, error = %e, "Refresh token rotation failed");
                AuthError::RotationFailed(e)
            })?;

        if !rotated {
            warn!(
                user_id = record.user_id,
                "Refresh token was already rotated, possible replay"
            );
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }

        let access_token = self
            .tokens
            .issue(record.user_id, self.settings.access_token_ttl)?;

        debug!(user_id = record.user_id, "Refresh token rotated");
        Ok(self.token_pair(access_token, replacement.token))
    }

    /// End a session by deleting its refresh token
    pub async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        let deleted = self
            .bounded("refresh_tokens.delete", self.refresh_tokens.delete(presented))
            .await?;
        if !deleted {
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }
        Ok(())
    }

    /// Validate an access token. Purely local, never touches storage.
    #[inline]
    pub fn validate_token(&self, token: &str) -> Result<i64, TokenError> {
        self.tokens.validate(token)
    }

    /// Public profile of an authenticated user. The password hash never
    /// leaves this method.
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, AuthError> {
        let user = self
            .bounded("users.find_by_id", self.users.find_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserProfile {
            id: user.id,
            login: user.login,
            email: user.email,
            created_at: user.created_at,
        })
    }

    /// Delete every refresh token that has expired
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let now = self.clock.now();
        Ok(self
            .bounded(
                "refresh_tokens.delete_expired",
                self.refresh_tokens.delete_expired(now),
            )
            .await?)
    }

    #[inline]
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.settings.access_token_ttl.num_seconds()
    }

    fn token_pair(&self, access_token: String, refresh_token: String) -> AuthTokens {
        AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_secs(),
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.settings.store_timeout, operation, fut).await
    }
}

/// Periodically delete expired refresh tokens
///
/// Expired tokens are already rejected on use; this only reclaims rows.
pub fn spawn_refresh_token_sweeper(
    service: Arc<AuthService>,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged expired refresh tokens"),
                Err(e) => warn!(error = %e, "Refresh token purge failed"),
            }
        }
    })
}
