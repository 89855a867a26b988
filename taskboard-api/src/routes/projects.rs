/// Project endpoints
///
/// - `POST   /api/projects` - Create project (caller becomes owner)
/// - `GET    /api/projects` - Projects the caller owns or belongs to
/// - `GET    /api/projects/:id` - Get project
/// - `PUT    /api/projects/:id` - Partial update (owner only)
/// - `DELETE /api/projects/:id` - Delete project (admin owner only)
///
/// Owner and members are returned as `{id, name, email}` references; users
/// that no longer exist show up as "Unknown user".

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
    models::project::{CreateProject, Project, ProjectPatch, ProjectView},
    store::resolve,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Project name is required"))]
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Loads a project or fails with 404
async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Create a new project
///
/// ```text
/// POST /api/projects
///
/// { "name": "Alpha", "description": "First project" }
/// ```
///
/// Returns `201` with the project. The caller is its owner and only member.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    req.validate()?;
    authorization::require(&auth.actor(), &Action::CreateProject)?;

    let project = state
        .store
        .create_project(CreateProject {
            name: req.name,
            description: req.description.filter(|d| !d.is_empty()),
            owner_id: auth.user_id,
        })
        .await?;

    info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    let view = resolve::project_view(state.store.as_ref(), project).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List projects visible to the caller
///
/// Only projects the caller owns or is a member of. Admins get no wider view.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let actor = auth.actor();

    let projects: Vec<Project> = state
        .store
        .list_projects_for(auth.user_id)
        .await?
        .into_iter()
        .filter(|p| authorization::authorize(&actor, &Action::ReadProject(p)).is_allow())
        .collect();

    let views = resolve::project_views(state.store.as_ref(), projects).await?;
    Ok(Json(views))
}

/// Get a project
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither owner nor member
/// - `404 Not Found`: Project doesn't exist
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectView>> {
    let project = load_project(&state, parse_id(&id, "Project")?).await?;
    authorization::require(&auth.actor(), &Action::ReadProject(&project))?;

    let view = resolve::project_view(state.store.as_ref(), project).await?;
    Ok(Json(view))
}

/// Update a project
///
/// ```text
/// PUT /api/projects/:id
///
/// { "name": "Renamed", "description": "", "status": "archived" }
/// ```
///
/// Missing or empty fields keep their stored value; `"description": null`
/// clears the description. An unknown status is rejected with 422.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Project doesn't exist
/// - `422 Unprocessable Entity`: Invalid status
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProjectPatch>,
) -> ApiResult<Json<ProjectView>> {
    let project = load_project(&state, parse_id(&id, "Project")?).await?;
    authorization::require(&auth.actor(), &Action::UpdateProject(&project))?;

    let update = project.merge(patch);
    let updated = state
        .store
        .update_project(project.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    info!(project_id = %updated.id, "Project updated");

    let view = resolve::project_view(state.store.as_ref(), updated).await?;
    Ok(Json(view))
}

/// Delete a project
///
/// Tasks referencing the project are left in place.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin or not the owner
/// - `404 Not Found`: Project doesn't exist
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state, parse_id(&id, "Project")?).await?;
    authorization::require(&auth.actor(), &Action::DeleteProject(&project))?;

    if !state.store.delete_project(project.id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    info!(project_id = %project.id, deleted_by = %auth.user_id, "Project deleted");

    Ok(Json(MessageResponse::new("Project removed")))
}
