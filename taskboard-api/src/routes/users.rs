/// User management endpoints
///
/// - `GET    /api/users` - List users (admin)
/// - `PUT    /api/users/block/:user_id` - Block account (admin)
/// - `PUT    /api/users/activate/:user_id` - Re-activate account (admin)
/// - `DELETE /api/users/delete/:user_id` - Hard delete (admin)
/// - `POST   /api/users/assign-task` - Attach a free-text task note
///
/// Blocking only refuses new logins. Tokens issued before the block keep
/// working until they expire.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{parse_id, ApiJson, MessageResponse},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{self, Action},
        middleware::AuthContext,
    },
    models::user::{TaskNote, User},
};
use tracing::info;
use validator::Validate;

/// `{ "message": ..., "user": ... }` response
#[derive(Debug, Serialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: User,
}

/// Assign task note request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    /// Target user
    pub user_id: String,

    /// Note text
    #[validate(length(min = 1, message = "Task description is required"))]
    pub task: String,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// List all users
///
/// Password hashes are never serialized.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    authorization::require(&auth.actor(), &Action::ListUsers)?;

    let users = state.store.list_users().await?;
    Ok(Json(users))
}

async fn set_active(
    state: &AppState,
    auth: &AuthContext,
    raw_id: &str,
    active: bool,
) -> ApiResult<User> {
    let action = if active {
        Action::ActivateUser
    } else {
        Action::BlockUser
    };
    authorization::require(&auth.actor(), &action)?;

    let user = state
        .store
        .set_user_active(parse_id(raw_id, "User")?, active)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, active, changed_by = %auth.user_id, "User active flag changed");

    Ok(user)
}

/// Block a user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User doesn't exist
pub async fn block_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserMessageResponse>> {
    let user = set_active(&state, &auth, &user_id, false).await?;

    Ok(Json(UserMessageResponse {
        message: "User blocked successfully".to_string(),
        user,
    }))
}

/// Re-activate a blocked user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User doesn't exist
pub async fn activate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserMessageResponse>> {
    let user = set_active(&state, &auth, &user_id, true).await?;

    Ok(Json(UserMessageResponse {
        message: "User activated successfully".to_string(),
        user,
    }))
}

/// Hard-delete a user
///
/// Projects they own and tasks assigned to them are left alone.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User doesn't exist
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    authorization::require(&auth.actor(), &Action::DeleteUser)?;

    let user_id = parse_id(&user_id, "User")?;
    if !state.store.delete_user(user_id).await? {
        return Err(user_not_found());
    }

    info!(user_id = %user_id, deleted_by = %auth.user_id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Attach a task note to a user
///
/// ```text
/// POST /api/users/assign-task
///
/// { "userId": "550e8400-e29b-41d4-a716-446655440000", "task": "Review PR" }
/// ```
///
/// The note is free text kept on the user record; it does not create or
/// reference a task.
///
/// # Errors
///
/// - `404 Not Found`: User doesn't exist
/// - `422 Unprocessable Entity`: Empty note
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<AssignTaskRequest>,
) -> ApiResult<Json<UserMessageResponse>> {
    req.validate()?;
    authorization::require(&auth.actor(), &Action::AssignTaskNote)?;

    let user = state
        .store
        .push_task_note(parse_id(&req.user_id, "User")?, TaskNote::new(req.task))
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, assigned_by = %auth.user_id, "Task note assigned");

    Ok(Json(UserMessageResponse {
        message: "Task assigned successfully".to_string(),
        user,
    }))
}
