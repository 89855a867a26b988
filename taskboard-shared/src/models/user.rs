/// User model
///
/// Users are identity records. Passwords are stored as Argon2id hashes and
/// never serialized back to clients.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('member', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(100) NOT NULL,
///     phone VARCHAR(32),
///     role user_role NOT NULL DEFAULT 'member',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     task_notes JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX idx_users_email_lower ON users (LOWER(email));
/// ```
///
/// # Lifecycle
///
/// - Created at registration (always active)
/// - `is_active` toggled only by an admin
/// - Hard-deleted by an admin. Projects they own and tasks assigned to them
///   keep their now dangling references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    Member,

    /// Can manage user accounts and delete tasks/projects
    Admin,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Admin => "admin",
        }
    }

    /// Returns true for the admin role
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Member
    }
}

/// Free-text note attached to a user record by `assign-task`
///
/// Unrelated to the `Task` entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNote {
    /// The note text
    pub description: String,

    /// When the note was attached
    pub assigned_at: DateTime<Utc>,
}

impl TaskNote {
    /// Creates a note stamped with the current time
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            assigned_at: Utc::now(),
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across users (case-insensitive)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Optional phone number
    pub phone: Option<String>,

    /// Account role
    pub role: UserRole,

    /// False once an admin blocks the account
    pub is_active: bool,

    /// Notes attached via `assign-task`
    pub tasks: Vec<TaskNote>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Short form used when a user is referenced from another entity
    pub fn summary(&self) -> UserRef {
        UserRef {
            id: self.id,
            name: self.name.clone(),
            email: Some(self.email.clone()),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Optional phone number
    pub phone: Option<String>,

    /// Initial role
    pub role: UserRole,
}

/// A resolved (or unresolvable) reference to a user
///
/// When the referenced account no longer exists, `name` is
/// [`UserRef::UNKNOWN_NAME`] and `email` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl UserRef {
    /// Display name used for dangling user references
    pub const UNKNOWN_NAME: &'static str = "Unknown user";

    /// Placeholder for a user that could not be found
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: Self::UNKNOWN_NAME.to_string(),
            email: None,
        }
    }

    /// Returns true if this reference could not be resolved
    pub fn is_unknown(&self) -> bool {
        self.email.is_none()
    }
}

/// Normalizes an email address for uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "u1@test.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "User One".to_string(),
            phone: Some("12345678".to_string()),
            role: UserRole::Member,
            is_active: true,
            tasks: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["isActive"], true);
        assert_eq!(json["role"], "member");
    }

    #[test]
    fn test_role_helpers() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Member.is_admin());
        assert_eq!(UserRole::default(), UserRole::Member);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_unknown_user_ref() {
        let id = Uuid::new_v4();
        let unknown = UserRef::unknown(id);
        assert_eq!(unknown.id, id);
        assert!(unknown.is_unknown());
        assert!(!sample_user().summary().is_unknown());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  U1@Test.COM "), "u1@test.com");
    }
}
