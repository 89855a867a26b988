//! Entity store abstraction.
//!
//! The store holds three collections (users, projects, tasks). References
//! between them are plain ids and are never enforced: deletes do not
//! cascade and writes do not check that a referenced entity exists.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                    store                       │
//! ├───────────────────────────────────────────────┤
//! │  mod.rs      - EntityStore trait, StoreError   │
//! │  memory.rs   - In-memory implementation        │
//! │  postgres.rs - PostgreSQL implementation       │
//! │  resolve.rs  - Orphan-tolerant read path       │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Enum-typed columns (project status, task status and priority) arrive at
//! the store as raw strings on create/update. The store is the only place
//! they are checked; an unknown value is a [`StoreError::Constraint`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    project::{CreateProject, Project, ProjectUpdate},
    task::{CreateTask, Task, TaskUpdate},
    user::{CreateUser, TaskNote, User},
};

pub mod memory;
pub mod postgres;
pub mod resolve;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another user already has this email
    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },

    /// A value was rejected by a storage-level constraint
    #[error("invalid value for {field}: {message}")]
    Constraint { field: &'static str, message: String },

    /// The backing database failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Async storage interface for users, projects and tasks.
///
/// Single-document operations are atomic; nothing spans collections.
/// Updates replace the mutable fields wholesale (last write wins) and return
/// `None` when the target no longer exists.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    /// Creates a user. Fails with `DuplicateEmail` if the email (compared
    /// case-insensitively) is taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Loads every user that still exists among `ids`
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Lists all users, oldest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>>;

    /// Appends a free-text note to the user's record
    async fn push_task_note(&self, id: Uuid, note: TaskNote) -> StoreResult<Option<User>>;

    /// Hard-deletes a user. Returns false if it did not exist.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // Projects

    /// Creates a project owned by `data.owner_id` with the owner as sole member
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Loads every project that still exists among `ids`
    async fn find_projects(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>>;

    /// Lists projects the user owns or is a member of, oldest first
    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> StoreResult<Option<Project>>;

    /// Deletes a project. Its tasks are left untouched.
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Tasks

    /// Creates a task. The project reference is not checked.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Lists all tasks, oldest first
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Lists tasks referencing `project_id`, oldest first
    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// Longest accepted project name or task title
pub const MAX_TITLE_LEN: usize = 255;

/// Longest accepted user display name
pub const MAX_USER_NAME_LEN: usize = 100;

/// Longest accepted email address
pub const MAX_EMAIL_LEN: usize = 255;

/// Longest accepted phone number
pub const MAX_PHONE_LEN: usize = 32;

/// Rejects values longer than `max` characters
pub(crate) fn check_max_len(field: &'static str, value: &str, max: usize) -> StoreResult<()> {
    if value.chars().count() > max {
        return Err(StoreError::Constraint {
            field,
            message: format!("{} must be at most {} characters", field, max),
        });
    }

    Ok(())
}

/// Rejects empty or over-long required text fields
pub(crate) fn check_required(field: &'static str, value: &str, max: usize) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::Constraint {
            field,
            message: format!("{} is required", field),
        });
    }

    check_max_len(field, value, max)
}

/// Column limits of the `users` table
pub(crate) fn check_new_user(data: &CreateUser) -> StoreResult<()> {
    check_required("email", data.email.trim(), MAX_EMAIL_LEN)?;
    check_required("name", &data.name, MAX_USER_NAME_LEN)?;
    if let Some(phone) = &data.phone {
        check_max_len("phone", phone, MAX_PHONE_LEN)?;
    }

    Ok(())
}

/// Parses a raw enum value, mapping failure to a constraint violation
pub(crate) fn parse_enum<T>(field: &'static str, raw: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|message| StoreError::Constraint { field, message })
}
