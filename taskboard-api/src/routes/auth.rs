/// Authentication endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get a bearer token
/// - `POST /api/auth/logout` - Stateless logout
/// - `GET  /api/auth/me` - Current user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{ApiJson, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User, UserRole},
    store::MAX_PHONE_LEN,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Optional phone number, digits only
    #[serde(default)]
    pub phone: Option<String>,

    /// Password (checked against the password policy)
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Identity returned with a fresh token
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,

    /// Seconds until the token expires
    pub expires_in: i64,

    pub user: SessionUser,
}

/// Rejects phone numbers with anything but digits, or too many of them
fn check_phone(phone: Option<String>) -> ApiResult<Option<String>> {
    let phone = phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    if let Some(ref p) = phone {
        if !p.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::invalid_field(
                "phone",
                "Phone number must contain digits only",
            ));
        }
        if p.len() > MAX_PHONE_LEN {
            return Err(ApiError::invalid_field(
                "phone",
                format!("Phone number must be at most {} digits", MAX_PHONE_LEN),
            ));
        }
    }

    Ok(phone)
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
///
/// { "name": "User One", "email": "u1@test.com", "phone": "5551234", "password": "secret1" }
/// ```
///
/// Returns `201` with the created user (no password hash). Emails listed in
/// `ADMIN_EMAILS` register as admins; everyone else is a member.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;
    let phone = check_phone(req.phone)?;

    let role = if state.config.is_admin_email(&req.email) {
        UserRole::Admin
    } else {
        UserRole::Member
    };

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            password_hash,
            name: req.name.trim().to_string(),
            phone,
            role,
        })
        .await?;

    info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// Login endpoint
///
/// ```text
/// POST /api/auth/login
///
/// { "email": "u1@test.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `403 Forbidden`: Account blocked by an admin
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is blocked".to_string()));
    }

    let lifetime = Duration::try_hours(state.config.jwt.expiration_hours).ok_or_else(|| {
        ApiError::InternalError("JWT expiration is out of range".to_string())
    })?;
    let claims = jwt::Claims::with_expiration(user.id, user.role, lifetime);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        user: SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
    }))
}

/// Logout endpoint
///
/// Tokens are not tracked server-side; the client discards its token. The
/// token itself stays valid until it expires.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> Json<MessageResponse> {
    info!(user_id = %auth.user_id, "User logged out");
    Json(MessageResponse::new("Logged out successfully"))
}

/// Returns the authenticated user
///
/// # Errors
///
/// - `404 Not Found`: The user was deleted between authentication and lookup
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
