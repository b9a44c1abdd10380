//! Data access for users, refresh tokens and tasks
//!
//! Services only see the [`UserStore`], [`RefreshTokenStore`] and
//! [`TaskStore`] traits. Postgres implementations back the running server;
//! [`MemoryStore`] backs tests and local experiments.

pub mod memory;
pub mod refresh_token;
pub mod task;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tasktrack_shared::tasks::{KanbanSpace, Task, TaskListQuery, TaskStatus};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use refresh_token::RefreshTokenRepository;
pub use task::TaskRepository;
pub use user::UserRepository;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Refresh token record from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Unique key a write collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Login,
    Email,
    RefreshToken,
    TaskDependency,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0:?}")]
    Conflict(UniqueField),

    #[error("store operation timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User lookups and creation
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a user. Duplicate login/email surfaces as [`StoreError::Conflict`].
    async fn create(
        &self,
        login: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;
}

/// Persistent refresh token storage
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Returns whether a row was removed
    async fn delete(&self, token: &str) -> Result<bool, StoreError>;

    /// Replace `old_token` with `replacement` as one all-or-nothing step.
    ///
    /// Returns `Ok(false)` without inserting anything when `old_token` is no
    /// longer stored, which is how a concurrent or replayed rotation shows up.
    async fn rotate(
        &self,
        old_token: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<bool, StoreError>;

    /// Remove every token expired at `now`, returning the number removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Task board storage
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task exactly as given, id and timestamps included
    async fn create_task(&self, task: &Task) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Overwrite every editable field. `Ok(None)` when the task is gone.
    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError>;

    /// Returns whether a row was removed. Dependency edges go with it.
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Tasks matching every given filter, newest first
    async fn list_tasks(&self, filter: &TaskListQuery) -> Result<Vec<Task>, StoreError>;

    async fn move_task(
        &self,
        id: Uuid,
        space: KanbanSpace,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError>;

    /// Record that `task_id` depends on `depends_on`. A repeated edge is
    /// [`StoreError::Conflict`] on [`UniqueField::TaskDependency`].
    async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<(), StoreError>;

    async fn remove_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<bool, StoreError>;

    /// Tasks that `task_id` depends on, oldest first
    async fn dependencies_of(&self, task_id: Uuid) -> Result<Vec<Task>, StoreError>;
}
