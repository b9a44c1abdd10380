//! Kanban task types
//!
//! Status, space and priority travel as lowercase snake_case strings on the
//! wire and in the database. Unknown values are rejected while deserializing,
//! so a request that names a bogus status never reaches the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Status
// ============================================================================

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

// ============================================================================
// Kanban space
// ============================================================================

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KanbanSpace {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl KanbanSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            KanbanSpace::Backlog => "backlog",
            KanbanSpace::Todo => "todo",
            KanbanSpace::InProgress => "in_progress",
            KanbanSpace::Review => "review",
            KanbanSpace::Done => "done",
        }
    }
}

impl fmt::Display for KanbanSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KanbanSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(KanbanSpace::Backlog),
            "todo" => Ok(KanbanSpace::Todo),
            "in_progress" => Ok(KanbanSpace::InProgress),
            "review" => Ok(KanbanSpace::Review),
            "done" => Ok(KanbanSpace::Done),
            _ => Err(format!("Unknown kanban space: {}", s)),
        }
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            _ => Err(format!("Unknown task priority: {}", s)),
        }
    }
}

// ============================================================================
// Requests and responses
// ============================================================================

/// A task on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub kanban_space: KanbanSpace,
    /// User who created the task
    pub owner_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create task request. Omitted status, space and priority take their
/// defaults (`todo`, `backlog`, `medium`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub kanban_space: KanbanSpace,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assigned_to: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Full replacement of a task's editable fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: String,
    pub status: TaskStatus,
    pub kanban_space: KanbanSpace,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assigned_to: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Move a task to another board column
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MoveTaskRequest {
    pub space: KanbanSpace,
    pub status: TaskStatus,
}

/// Filters for listing tasks; both are optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub space: Option<KanbanSpace>,
    pub status: Option<TaskStatus>,
}

/// Declare that a task cannot start before another one
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddDependencyRequest {
    pub depends_on: Uuid,
}

/// A task together with the tasks it depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithDependencies {
    #[serde(flatten)]
    pub task: Task,
    pub dependencies: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(TaskStatus::Todo)]
    #[case(TaskStatus::InProgress)]
    #[case(TaskStatus::Review)]
    #[case(TaskStatus::Done)]
    fn test_status_string_matches_wire_name(#[case] status: TaskStatus) {
        let wire = serde_json::to_value(status).unwrap();
        assert_eq!(wire, status.as_str());
        assert_eq!(TaskStatus::from_str(status.as_str()), Ok(status));
    }

    #[test]
    fn test_backlog_is_a_space_but_not_a_status() {
        assert_eq!(KanbanSpace::from_str("backlog"), Ok(KanbanSpace::Backlog));
        assert!(TaskStatus::from_str("backlog").is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "Write docs"}"#).unwrap();
        assert_eq!(req.status, TaskStatus::Todo);
        assert_eq!(req.kanban_space, KanbanSpace::Backlog);
        assert_eq!(req.priority, TaskPriority::Medium);
        assert!(req.description.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        let result: Result<CreateTaskRequest, _> =
            serde_json::from_str(r#"{"title": "x", "priority": "whenever"}"#);
        assert!(result.is_err());
    }

    #[rstest]
    #[case("")]
    #[case(&"x".repeat(201))]
    fn test_title_length_enforced(#[case] title: &str) {
        let req = CreateTaskRequest {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::default(),
            kanban_space: KanbanSpace::default(),
            priority: TaskPriority::default(),
            assigned_to: None,
            due_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_dependencies_flatten_task_fields() {
        let now = Utc::now();
        let task = Task {
            id: Uuid::nil(),
            title: "Ship".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            kanban_space: KanbanSpace::Todo,
            owner_id: 1,
            assigned_to: None,
            priority: TaskPriority::High,
            due_date: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(TaskWithDependencies {
            task,
            dependencies: Vec::new(),
        })
        .unwrap();
        assert_eq!(json["title"], "Ship");
        assert_eq!(json["priority"], "high");
        assert!(json["dependencies"].as_array().unwrap().is_empty());
        assert!(json.get("assigned_to").is_none());
    }
}
