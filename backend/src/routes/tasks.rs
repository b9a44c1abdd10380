//! Kanban task routes
//!
//! Mounted behind [`crate::auth::auth_middleware`].

use super::extract::ValidatedJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use tasktrack_shared::tasks::{
    AddDependencyRequest, CreateTaskRequest, MoveTaskRequest, Task, TaskListQuery,
    TaskWithDependencies, UpdateTaskRequest,
};
use uuid::Uuid;

/// Create task routes
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/move", post(move_task))
        .route(
            "/:id/dependencies",
            get(get_dependencies).post(add_dependency),
        )
        .route("/:id/dependencies/:depends_on", delete(remove_dependency))
}

/// POST /api/v1/tasks - Create a task owned by the caller
async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks().create(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/v1/tasks?space=&status= - List tasks, newest first
async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(filter) = query.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let tasks = state.tasks().list(&filter).await?;
    Ok(Json(tasks))
}

/// GET /api/v1/tasks/:id
async fn get_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Task>> {
    let task = state.tasks().get(id).await?;
    Ok(Json(task))
}

/// PUT /api/v1/tasks/:id - Replace the editable fields
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks().update(id, req).await?;
    Ok(Json(task))
}

/// DELETE /api/v1/tasks/:id
async fn delete_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.tasks().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tasks/:id/move - Change board column and status
async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<MoveTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks().move_task(id, req).await?;
    Ok(Json(task))
}

/// GET /api/v1/tasks/:id/dependencies
async fn get_dependencies(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskWithDependencies>> {
    let task = state.tasks().get_with_dependencies(id).await?;
    Ok(Json(task))
}

/// POST /api/v1/tasks/:id/dependencies
async fn add_dependency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddDependencyRequest>,
) -> ApiResult<(StatusCode, Json<TaskWithDependencies>)> {
    state.tasks().add_dependency(id, req.depends_on).await?;
    let task = state.tasks().get_with_dependencies(id).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// DELETE /api/v1/tasks/:id/dependencies/:depends_on
async fn remove_dependency(
    State(state): State<AppState>,
    Path((id, depends_on)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.tasks().remove_dependency(id, depends_on).await?;
    Ok(StatusCode::NO_CONTENT)
}
