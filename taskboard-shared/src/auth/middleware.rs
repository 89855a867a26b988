/// Bearer-token authentication
///
/// The API's auth layer calls [`authenticate`] with the `Authorization`
/// header and inserts the resulting [`AuthContext`] into the request
/// extensions. Handlers then extract it with `Extension<AuthContext>`.
///
/// The token only proves identity. The role is re-read from the user record
/// on every request, so promotions and demotions take effect immediately.
/// `is_active` is NOT consulted here: blocking a user stops new logins but
/// leaves already-issued tokens working until they expire.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {} ({})", auth.user_id, auth.role.as_str())
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::authorization::Actor;
use super::jwt::{validate_token, JwtError};
use crate::models::user::{User, UserRole};
use crate::store::{EntityStore, StoreError};

/// Per-request identity of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role as currently stored on the user record
    pub role: UserRole,

    /// Email on the user record
    pub email: String,
}

impl AuthContext {
    /// Builds the context from a freshly loaded user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            email: user.email.clone(),
        }
    }

    /// The actor handed to the authorization core
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }

    /// Returns true if the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but its user no longer exists
    #[error("User no longer exists")]
    UnknownUser,

    /// Loading the user failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Invalid Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat` for a bad header
/// - `InvalidToken` for a bad or expired token
/// - `UnknownUser` when the token's subject has been deleted
/// - `Store` if the user lookup fails
pub async fn authenticate<S>(
    store: &S,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError>
where
    S: EntityStore + ?Sized,
{
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    debug!(user_id = %user.id, role = user.role.as_str(), "Request authenticated");
    Ok(AuthContext::from_user(&user))
}
