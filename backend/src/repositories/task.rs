//! Task repository for database operations

use super::{StoreError, TaskStore, UniqueField};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tasktrack_shared::tasks::{KanbanSpace, Task, TaskListQuery, TaskStatus};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, status, kanban_space, owner_id, \
                            assigned_to, priority, due_date, created_at, updated_at";

/// Postgres-backed [`TaskStore`]
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw `tasks` row; enum columns are stored as text
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: String,
    status: String,
    kanban_space: String,
    owner_id: i64,
    assigned_to: Option<i64>,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = sqlx::Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status.parse().map_err(decode_error)?,
            kanban_space: row.kanban_space.parse().map_err(decode_error)?,
            owner_id: row.owner_id,
            assigned_to: row.assigned_to,
            priority: row.priority.parse().map_err(decode_error)?,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    rows.into_iter()
        .map(|row| Task::try_from(row).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn create_task(&self, task: &Task) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, status, kanban_space, owner_id,
                               assigned_to, priority, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.kanban_space.as_str())
        .bind(task.owner_id)
        .bind(task.assigned_to)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_into()?)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, kanban_space = $5,
                assigned_to = $6, priority = $7, due_date = $8, updated_at = $9
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.kanban_space.as_str())
        .bind(task.assigned_to)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, filter: &TaskListQuery) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::TEXT IS NULL OR kanban_space = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.space.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }

    async fn move_task(
        &self,
        id: Uuid,
        space: KanbanSpace,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET kanban_space = $2, status = $3, updated_at = $4
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(space.as_str())
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO task_dependencies (task_id, depends_on) VALUES ($1, $2)")
            .bind(task_id)
            .bind(depends_on)
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::Conflict(UniqueField::TaskDependency)
                }
                _ => StoreError::Database(err),
            })?;

        Ok(())
    }

    async fn remove_dependency(&self, task_id: Uuid, depends_on: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM task_dependencies WHERE task_id = $1 AND depends_on = $2")
                .bind(task_id)
                .bind(depends_on)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn dependencies_of(&self, task_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.kanban_space, t.owner_id,
                   t.assigned_to, t.priority, t.due_date, t.created_at, t.updated_at
            FROM task_dependencies d
            JOIN tasks t ON t.id = d.depends_on
            WHERE d.task_id = $1
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }
}
