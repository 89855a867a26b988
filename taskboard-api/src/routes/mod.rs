/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login, logout, current user
/// - `projects`: Project CRUD
/// - `tasks`: Task CRUD
/// - `users`: Admin user management and task notes
///
/// Handlers follow the same shape: load the target (404 if missing), ask the
/// authorization core, perform one store operation, resolve references for
/// the response.

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use axum::extract::FromRequest;
use uuid::Uuid;

/// JSON body extractor whose rejections use the API error format
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Parses a path id; anything that is not an id cannot exist
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", resource)))
}

/// `{ "message": ... }` body used by endpoints with nothing else to return
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
