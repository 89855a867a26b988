/// Task model
///
/// A task is a unit of work scoped to one project. Tasks have no owner:
/// any authenticated user may create or edit one, only admins delete.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(255) NOT NULL CHECK (title <> ''),
///     description TEXT,
///     project_id UUID NOT NULL,
///     assigned_to UUID,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     deadline DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `project_id` and `assigned_to` are plain columns. Deleting the project or
/// the user leaves the task in place with a dangling reference.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::patch::Patch;
use super::project::ProjectRef;
use super::user::UserRef;
use super::FieldError;

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    #[sqlx(rename = "pending")]
    Pending,

    #[serde(rename = "in progress")]
    #[sqlx(rename = "in progress")]
    InProgress,

    #[serde(rename = "completed")]
    #[sqlx(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// Every accepted value, in declaration order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid task status", s))
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Every accepted value, in declaration order
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    /// Converts priority to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid task priority", s))
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (never empty)
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Project this task belongs to (may no longer exist)
    pub project_id: Uuid,

    /// Assigned user (may no longer exist)
    pub assigned_to: Option<Uuid>,

    /// Progress status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Merges a partial update over the stored values
    ///
    /// Status and priority are passed through as raw strings for the store
    /// to accept or reject. References and dates are parsed here.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if `assignedTo` is not an id or `deadline`
    /// is not a date.
    pub fn merge(&self, patch: TaskPatch) -> Result<TaskUpdate, FieldError> {
        let patch = patch.normalized();

        let assigned_to = patch
            .assigned_to
            .try_map(|raw| parse_reference("assignedTo", &raw))?;
        let deadline = patch.deadline.try_map(|raw| parse_deadline(&raw))?;

        Ok(TaskUpdate {
            title: patch.title.apply_required(self.title.clone()),
            description: patch.description.apply_optional(self.description.clone()),
            status: patch.status.apply_required(self.status.as_str().to_string()),
            assigned_to: assigned_to.apply_optional(self.assigned_to),
            deadline: deadline.apply_optional(self.deadline),
            priority: patch.priority.apply_required(self.priority.as_str().to_string()),
        })
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub deadline: Option<NaiveDate>,

    /// Raw priority, defaults to `medium` when `None`
    pub priority: Option<String>,

    /// Raw initial status, defaults to `pending` when `None`
    pub status: Option<String>,
}

/// Partial update body for `PUT /tasks/:id`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Patch<String>,

    #[serde(default)]
    pub description: Patch<String>,

    #[serde(default)]
    pub status: Patch<String>,

    #[serde(default)]
    pub assigned_to: Patch<String>,

    #[serde(default)]
    pub deadline: Patch<String>,

    #[serde(default)]
    pub priority: Patch<String>,
}

impl TaskPatch {
    /// Folds empty strings into "not supplied"
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.non_blank(),
            description: self.description.non_blank(),
            status: self.status.non_blank(),
            assigned_to: self.assigned_to.non_blank(),
            deadline: self.deadline.non_blank(),
            priority: self.priority.non_blank(),
        }
    }
}

/// Full set of mutable fields written back by an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,

    /// Raw status value, checked by the store
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub deadline: Option<NaiveDate>,

    /// Raw priority value, checked by the store
    pub priority: String,
}

/// Task as returned to clients, with references resolved
///
/// `project` is `null` when the project has been deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub project: Option<ProjectRef>,
    pub assigned_to: Option<UserRef>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parses an entity reference supplied by a client
pub fn parse_reference(field: &'static str, raw: &str) -> Result<Uuid, FieldError> {
    Uuid::parse_str(raw.trim()).map_err(|_| FieldError::new(field, "Invalid reference id"))
}

/// Parses a deadline given as `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_deadline(raw: &str) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| FieldError::new("deadline", "Deadline must be a date (YYYY-MM-DD)"))
}
