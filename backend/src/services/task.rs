//! Kanban task service
//!
//! The board is shared: any authenticated user can read and change any task.
//! The creator is recorded as the owner. Dependencies form a directed graph
//! that must stay acyclic.

use super::bounded;
use crate::auth::Clock;
use crate::repositories::{StoreError, TaskStore, UniqueField, UserStore};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tasktrack_shared::tasks::{
    CreateTaskRequest, MoveTaskRequest, Task, TaskListQuery, TaskWithDependencies,
    UpdateTaskRequest,
};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,

    #[error("Dependency not found")]
    DependencyNotFound,

    #[error("Assignee does not exist")]
    AssigneeNotFound,

    #[error("A task cannot depend on itself")]
    SelfDependency,

    #[error("Dependency would create a cycle")]
    DependencyCycle,

    #[error("Dependency already exists")]
    DuplicateDependency,

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            tasks,
            users,
            clock,
            store_timeout,
        }
    }

    /// Create a task owned by `owner_id`
    pub async fn create(&self, owner_id: i64, req: CreateTaskRequest) -> Result<Task, TaskError> {
        self.ensure_assignee(req.assigned_to).await?;

        let now = self.clock.now();
        let task = Task {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            status: req.status,
            kanban_space: req.kanban_space,
            owner_id,
            assigned_to: req.assigned_to,
            priority: req.priority,
            due_date: req.due_date,
            created_at: now,
            updated_at: now,
        };

        let task = self
            .bounded("tasks.create", self.tasks.create_task(&task))
            .await?;

        info!(task_id = %task.id, owner_id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, TaskError> {
        self.bounded("tasks.find", self.tasks.find_task(id))
            .await?
            .ok_or(TaskError::NotFound)
    }

    /// A task and the tasks it waits on
    pub async fn get_with_dependencies(&self, id: Uuid) -> Result<TaskWithDependencies, TaskError> {
        let task = self.get(id).await?;
        let dependencies = self
            .bounded("tasks.dependencies_of", self.tasks.dependencies_of(id))
            .await?;

        Ok(TaskWithDependencies { task, dependencies })
    }

    pub async fn list(&self, filter: &TaskListQuery) -> Result<Vec<Task>, TaskError> {
        Ok(self
            .bounded("tasks.list", self.tasks.list_tasks(filter))
            .await?)
    }

    /// Replace the editable fields of a task. Owner and creation time stay.
    pub async fn update(&self, id: Uuid, req: UpdateTaskRequest) -> Result<Task, TaskError> {
        let current = self.get(id).await?;
        self.ensure_assignee(req.assigned_to).await?;

        let task = Task {
            title: req.title,
            description: req.description,
            status: req.status,
            kanban_space: req.kanban_space,
            assigned_to: req.assigned_to,
            priority: req.priority,
            due_date: req.due_date,
            updated_at: self.clock.now(),
            ..current
        };

        let updated = self
            .bounded("tasks.update", self.tasks.update_task(&task))
            .await?
            .ok_or(TaskError::NotFound)?;

        debug!(task_id = %id, "Task updated");
        Ok(updated)
    }

    pub async fn move_task(&self, id: Uuid, req: MoveTaskRequest) -> Result<Task, TaskError> {
        let moved = self
            .bounded(
                "tasks.move",
                self.tasks
                    .move_task(id, req.space, req.status, self.clock.now()),
            )
            .await?
            .ok_or(TaskError::NotFound)?;

        debug!(task_id = %id, space = %req.space, status = %req.status, "Task moved");
        Ok(moved)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), TaskError> {
        let deleted = self
            .bounded("tasks.delete", self.tasks.delete_task(id))
            .await?;
        if !deleted {
            return Err(TaskError::NotFound);
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Make `task_id` wait on `depends_on`
    pub async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<(), TaskError> {
        if task_id == depends_on {
            return Err(TaskError::SelfDependency);
        }
        self.get(task_id).await?;
        self.bounded("tasks.find", self.tasks.find_task(depends_on))
            .await?
            .ok_or(TaskError::DependencyNotFound)?;

        if self.reaches(depends_on, task_id).await? {
            return Err(TaskError::DependencyCycle);
        }

        self.bounded(
            "tasks.add_dependency",
            self.tasks.add_dependency(task_id, depends_on),
        )
        .await
        .map_err(|e| match e {
            StoreError::Conflict(UniqueField::TaskDependency) => TaskError::DuplicateDependency,
            other => TaskError::Storage(other),
        })?;

        debug!(task_id = %task_id, depends_on = %depends_on, "Dependency added");
        Ok(())
    }

    pub async fn remove_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<(), TaskError> {
        let removed = self
            .bounded(
                "tasks.remove_dependency",
                self.tasks.remove_dependency(task_id, depends_on),
            )
            .await?;
        if !removed {
            return Err(TaskError::DependencyNotFound);
        }
        Ok(())
    }

    /// Whether `target` is reachable from `start` along dependency edges
    async fn reaches(&self, start: Uuid, target: Uuid) -> Result<bool, TaskError> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let next = self
                .bounded("tasks.dependencies_of", self.tasks.dependencies_of(current))
                .await?;
            for dependency in next {
                if dependency.id == target {
                    return Ok(true);
                }
                if seen.insert(dependency.id) {
                    queue.push_back(dependency.id);
                }
            }
        }

        Ok(false)
    }

    async fn ensure_assignee(&self, assigned_to: Option<i64>) -> Result<(), TaskError> {
        let Some(user_id) = assigned_to else {
            return Ok(());
        };
        self.bounded("users.find_by_id", self.users.find_by_id(user_id))
            .await?
            .map(|_| ())
            .ok_or(TaskError::AssigneeNotFound)
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.store_timeout, operation, fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ManualClock;
    use crate::repositories::MemoryStore;
    use chrono::Duration as ChronoDuration;
    use tasktrack_shared::tasks::{KanbanSpace, TaskPriority, TaskStatus};

    struct Harness {
        service: TaskService,
        clock: Arc<ManualClock>,
        owner: i64,
    }

    async fn harness() -> Harness {
        let store = MemoryStore::new();
        let owner = store
            .create("alice", "alice@x.com", "$argon2id$hash")
            .await
            .unwrap()
            .id;
        let clock = Arc::new(ManualClock::default());
        let service = TaskService::new(
            Arc::new(store.clone()),
            Arc::new(store),
            clock.clone(),
            Duration::from_secs(5),
        );
        Harness {
            service,
            clock,
            owner,
        }
    }

    fn new_task(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::default(),
            kanban_space: KanbanSpace::default(),
            priority: TaskPriority::default(),
            assigned_to: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults_and_owner() {
        let h = harness().await;
        let task = h.service.create(h.owner, new_task("Write docs")).await.unwrap();

        assert_eq!(task.owner_id, h.owner);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.kanban_space, KanbanSpace::Backlog);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(h.service.get(task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_unknown_assignee_rejected() {
        let h = harness().await;
        let req = CreateTaskRequest {
            assigned_to: Some(404),
            ..new_task("Orphan")
        };
        let err = h.service.create(h.owner, req).await.unwrap_err();
        assert!(matches!(err, TaskError::AssigneeNotFound));
        assert!(h.service.list(&TaskListQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_owner_and_created_at() {
        let h = harness().await;
        let task = h.service.create(h.owner, new_task("Draft")).await.unwrap();
        h.clock.advance(ChronoDuration::minutes(10));

        let updated = h
            .service
            .update(
                task.id,
                UpdateTaskRequest {
                    title: "Final".to_string(),
                    description: "ready".to_string(),
                    status: TaskStatus::Review,
                    kanban_space: KanbanSpace::Review,
                    priority: TaskPriority::High,
                    assigned_to: Some(h.owner),
                    due_date: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.owner_id, h.owner);
        assert_eq!(updated.assigned_to, Some(h.owner));
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.updated_at - task.created_at, ChronoDuration::minutes(10));
    }

    #[tokio::test]
    async fn test_move_and_delete_missing_task() {
        let h = harness().await;
        let missing = Uuid::new_v4();

        let err = h
            .service
            .move_task(
                missing,
                MoveTaskRequest {
                    space: KanbanSpace::Done,
                    status: TaskStatus::Done,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound));
        assert!(matches!(
            h.service.delete(missing).await,
            Err(TaskError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_move_changes_space_and_status() {
        let h = harness().await;
        let task = h.service.create(h.owner, new_task("Ship")).await.unwrap();

        let moved = h
            .service
            .move_task(
                task.id,
                MoveTaskRequest {
                    space: KanbanSpace::InProgress,
                    status: TaskStatus::InProgress,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.kanban_space, KanbanSpace::InProgress);
        assert_eq!(moved.status, TaskStatus::InProgress);
        assert_eq!(moved.title, "Ship");
    }

    #[tokio::test]
    async fn test_dependency_rules() {
        let h = harness().await;
        let a = h.service.create(h.owner, new_task("a")).await.unwrap();
        let b = h.service.create(h.owner, new_task("b")).await.unwrap();
        let c = h.service.create(h.owner, new_task("c")).await.unwrap();

        assert!(matches!(
            h.service.add_dependency(a.id, a.id).await,
            Err(TaskError::SelfDependency)
        ));
        assert!(matches!(
            h.service.add_dependency(a.id, Uuid::new_v4()).await,
            Err(TaskError::DependencyNotFound)
        ));

        // a -> b -> c
        h.service.add_dependency(a.id, b.id).await.unwrap();
        h.service.add_dependency(b.id, c.id).await.unwrap();

        assert!(matches!(
            h.service.add_dependency(a.id, b.id).await,
            Err(TaskError::DuplicateDependency)
        ));
        assert!(matches!(
            h.service.add_dependency(c.id, a.id).await,
            Err(TaskError::DependencyCycle)
        ));

        let with_deps = h.service.get_with_dependencies(a.id).await.unwrap();
        assert_eq!(with_deps.dependencies.len(), 1);
        assert_eq!(with_deps.dependencies[0].id, b.id);

        h.service.remove_dependency(a.id, b.id).await.unwrap();
        assert!(matches!(
            h.service.remove_dependency(a.id, b.id).await,
            Err(TaskError::DependencyNotFound)
        ));
        // With the edge gone, c may now wait on a
        h.service.add_dependency(c.id, a.id).await.unwrap();
    }
}
