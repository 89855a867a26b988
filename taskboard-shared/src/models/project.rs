/// Project model
///
/// A project is a named collaboration container with exactly one owner and a
/// set of members. The owner is added to `member_ids` at creation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('active', 'inactive', 'archived');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL CHECK (name <> ''),
///     description TEXT,
///     owner_id UUID NOT NULL,
///     member_ids UUID[] NOT NULL DEFAULT '{}',
///     status project_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `owner_id` and `member_ids` carry no foreign keys. Deleting a user leaves
/// them dangling and nothing prunes the member list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::patch::Patch;
use super::user::UserRef;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Inactive,
    Archived,
}

impl ProjectStatus {
    /// Every accepted value, in declaration order
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Active,
        ProjectStatus::Inactive,
        ProjectStatus::Archived,
    ];

    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid project status", s))
    }
}

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name (never empty)
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user
    pub owner_id: Uuid,

    /// Members with read access (includes the owner at creation)
    pub member_ids: Vec<Uuid>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Returns true if `user_id` owns this project
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Returns true if `user_id` is listed as a member
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Merges a partial update over the stored values
    ///
    /// Status is passed through as a raw string; the store decides whether
    /// it is acceptable.
    pub fn merge(&self, patch: ProjectPatch) -> ProjectUpdate {
        let patch = patch.normalized();

        ProjectUpdate {
            name: patch.name.apply_required(self.name.clone()),
            description: patch.description.apply_optional(self.description.clone()),
            status: patch.status.apply_required(self.status.as_str().to_string()),
        }
    }
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Creating user; becomes owner and sole member
    pub owner_id: Uuid,
}

/// Partial update body for `PUT /projects/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Patch<String>,

    #[serde(default)]
    pub description: Patch<String>,

    #[serde(default)]
    pub status: Patch<String>,
}

impl ProjectPatch {
    /// Folds empty strings into "not supplied"
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.non_blank(),
            description: self.description.non_blank(),
            status: self.status.non_blank(),
        }
    }
}

/// Full set of mutable fields written back by an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: String,
    pub description: Option<String>,

    /// Raw status value, checked by the store
    pub status: String,
}

/// Project as returned to clients, with owner and members resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: UserRef,
    pub members: Vec<UserRef>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short reference to a project, embedded in task views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&Project> for ProjectRef {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
        }
    }
}
