//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Everything in here is built once at startup and is read-only while
//! serving requests. Cloning is a handful of `Arc` increments.

use crate::auth::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::repositories::{
    RefreshTokenRepository, RefreshTokenStore, TaskRepository, TaskStore, UserRepository,
    UserStore,
};
use crate::services::{AuthService, TaskService};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the readiness check
    pub db: PgPool,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Session lifecycle service with the pre-computed signing key
    pub auth: Arc<AuthService>,
    /// Kanban board operations
    pub tasks: Arc<TaskService>,
}

impl AppState {
    /// Create the application state backed by Postgres stores
    ///
    /// Derives the signing key and hashing parameters from `config`; call it
    /// once at startup.
    pub fn new(db: PgPool, config: AppConfig) -> Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db.clone()));
        let refresh_tokens: Arc<dyn RefreshTokenStore> =
            Arc::new(RefreshTokenRepository::new(db.clone()));
        let tasks: Arc<dyn TaskStore> = Arc::new(TaskRepository::new(db.clone()));

        Self::with_stores(db, config, users, refresh_tokens, tasks, Arc::new(SystemClock))
    }

    /// Create the application state over arbitrary stores and clock
    pub fn with_stores(
        db: PgPool,
        config: AppConfig,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        tasks: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let auth =
            AuthService::from_config(&config, users.clone(), refresh_tokens, clock.clone())?;
        let store_timeout = std::time::Duration::from_millis(config.auth.store_timeout_ms);
        let tasks = TaskService::new(tasks, users, clock, store_timeout);

        Ok(Self {
            db,
            config: Arc::new(config),
            auth: Arc::new(auth),
            tasks: Arc::new(tasks),
        })
    }

    /// Get a reference to the database pool
    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the authentication service
    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Get a reference to the task service
    #[inline]
    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }
}
