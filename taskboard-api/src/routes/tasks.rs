/// Task endpoints
///
/// - `POST   /api/tasks` - Create task
/// - `GET    /api/tasks` - List all tasks
/// - `GET    /api/tasks/project/:project_id` - Tasks referencing a project
/// - `GET    /api/tasks/:id` - Get task
/// - `PUT    /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete task (admin)
///
/// Any authenticated user may create, read and edit tasks. The project
/// reference is never checked; a task whose project was deleted is returned
/// with `"project": null`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{parse_id, ApiJson, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{self, Action},
        middleware::AuthContext,
    },
    models::task::{parse_deadline, parse_reference, CreateTask, Task, TaskPatch, TaskView},
    store::resolve,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create task request
///
/// The project may be given as `project` or `projectId`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Task title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub assigned_to: Option<String>,

    /// `YYYY-MM-DD` or RFC 3339
    #[serde(default)]
    pub deadline: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CreateTaskRequest {
    /// Parses references and dates into store input
    fn into_create(self) -> ApiResult<CreateTask> {
        let project = non_blank(self.project)
            .or_else(|| non_blank(self.project_id))
            .ok_or_else(|| ApiError::invalid_field("project", "Project is required"))?;

        let project_id = parse_reference("project", &project)?;
        let assigned_to = non_blank(self.assigned_to)
            .map(|raw| parse_reference("assignedTo", &raw))
            .transpose()?;
        let deadline = non_blank(self.deadline)
            .map(|raw| parse_deadline(&raw))
            .transpose()?;

        Ok(CreateTask {
            title: self.title,
            description: non_blank(self.description),
            project_id,
            assigned_to,
            deadline,
            priority: non_blank(self.priority),
            status: non_blank(self.status),
        })
    }
}

async fn load_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    state
        .store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Create a task
///
/// ```text
/// POST /api/tasks
///
/// {
///   "title": "Write report",
///   "project": "550e8400-e29b-41d4-a716-446655440000",
///   "assignedTo": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
///   "deadline": "2025-01-31",
///   "priority": "high"
/// }
/// ```
///
/// Returns `201` with the task.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing title or project, malformed
///   reference or date, unknown status or priority
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate()?;
    authorization::require(&auth.actor(), &Action::CreateTask)?;

    let task = state.store.create_task(req.into_create()?).await?;

    info!(
        task_id = %task.id,
        project_id = %task.project_id,
        created_by = %auth.user_id,
        "Task created"
    );

    let view = resolve::task_view(state.store.as_ref(), task).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List all tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskView>>> {
    authorization::require(&auth.actor(), &Action::ReadTask)?;

    let tasks = state.store.list_tasks().await?;
    let views = resolve::task_views(state.store.as_ref(), tasks).await?;
    Ok(Json(views))
}

/// List tasks referencing a project
///
/// Filters by reference only: the project need not exist, and an id that
/// cannot match anything yields an empty list.
pub async fn list_tasks_by_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<TaskView>>> {
    authorization::require(&auth.actor(), &Action::ReadTask)?;

    let Ok(project_id) = Uuid::parse_str(&project_id) else {
        return Ok(Json(Vec::new()));
    };

    let tasks = state.store.list_tasks_by_project(project_id).await?;
    let views = resolve::task_views(state.store.as_ref(), tasks).await?;
    Ok(Json(views))
}

/// Get a task
///
/// # Errors
///
/// - `404 Not Found`: Task doesn't exist
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    authorization::require(&auth.actor(), &Action::ReadTask)?;

    let task = load_task(&state, parse_id(&id, "Task")?).await?;
    let view = resolve::task_view(state.store.as_ref(), task).await?;
    Ok(Json(view))
}

/// Update a task
///
/// ```text
/// PUT /api/tasks/:id
///
/// { "status": "in progress", "assignedTo": null }
/// ```
///
/// Missing or empty fields keep their stored value. `null` clears
/// `description`, `assignedTo` and `deadline`.
///
/// # Errors
///
/// - `404 Not Found`: Task doesn't exist
/// - `422 Unprocessable Entity`: Unknown status or priority, malformed
///   reference or date
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Json<TaskView>> {
    let task = load_task(&state, parse_id(&id, "Task")?).await?;
    authorization::require(&auth.actor(), &Action::UpdateTask)?;

    let update = task.merge(patch)?;
    let updated = state
        .store
        .update_task(task.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    info!(task_id = %updated.id, updated_by = %auth.user_id, "Task updated");

    let view = resolve::task_view(state.store.as_ref(), updated).await?;
    Ok(Json(view))
}

/// Delete a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Task doesn't exist
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    authorization::require(&auth.actor(), &Action::DeleteTask)?;

    let task_id = parse_id(&id, "Task")?;
    if !state.store.delete_task(task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(task_id = %task_id, deleted_by = %auth.user_id, "Task deleted");

    Ok(Json(MessageResponse::new("Task removed")))
}
