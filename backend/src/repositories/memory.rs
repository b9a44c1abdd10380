//! In-process store implementing every store trait
//!
//! Rotation happens under a single write lock, giving the same "at most one
//! winner" behaviour as the Postgres transaction.

use super::{
    RefreshTokenRecord, RefreshTokenStore, StoreError, TaskStore, UniqueField, UserRecord,
    UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tasktrack_shared::tasks::{KanbanSpace, Task, TaskListQuery, TaskStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    tasks: Vec<Task>,
    /// `(task_id, depends_on)` edges
    task_dependencies: Vec<(Uuid, Uuid)>,
}

/// Shared in-memory user, refresh token and task store
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh tokens
    pub async fn refresh_token_count(&self) -> usize {
        self.state.read().await.refresh_tokens.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.login == login).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(
        &self,
        login: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.login == login) {
            return Err(StoreError::Conflict(UniqueField::Login));
        }
        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: state.users.len() as i64 + 1,
            login: login.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.refresh_tokens.contains_key(&record.token) {
            return Err(StoreError::Conflict(UniqueField::RefreshToken));
        }
        state
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.state.read().await.refresh_tokens.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.state.write().await.refresh_tokens.remove(token).is_some())
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;

        if state.refresh_tokens.remove(old_token).is_none() {
            return Ok(false);
        }
        state
            .refresh_tokens
            .insert(replacement.token.clone(), replacement.clone());

        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, record| !record.is_expired_at(now));
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: &Task) -> Result<Task, StoreError> {
        self.state.write().await.tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(None);
        };

        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.kanban_space = task.kanban_space;
        stored.assigned_to = task.assigned_to;
        stored.priority = task.priority;
        stored.due_date = task.due_date;
        stored.updated_at = task.updated_at;

        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Ok(false);
        }
        state
            .task_dependencies
            .retain(|&(task_id, depends_on)| task_id != id && depends_on != id);
        Ok(true)
    }

    async fn list_tasks(&self, filter: &TaskListQuery) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .rev()
            .filter(|t| filter.space.map_or(true, |space| t.kanban_space == space))
            .filter(|t| filter.status.map_or(true, |status| t.status == status))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn move_task(
        &self,
        id: Uuid,
        space: KanbanSpace,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            task.kanban_space = space;
            task.status = status;
            task.updated_at = at;
            task.clone()
        }))
    }

    async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.task_dependencies.contains(&(task_id, depends_on)) {
            return Err(StoreError::Conflict(UniqueField::TaskDependency));
        }
        state.task_dependencies.push((task_id, depends_on));
        Ok(())
    }

    async fn remove_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.task_dependencies.len();
        state
            .task_dependencies
            .retain(|&edge| edge != (task_id, depends_on));
        Ok(state.task_dependencies.len() < before)
    }

    async fn dependencies_of(&self, task_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .task_dependencies
            .iter()
            .filter(|(from, _)| *from == task_id)
            .filter_map(|(_, to)| state.tasks.iter().find(|t| t.id == *to).cloned())
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }
}
