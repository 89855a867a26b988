/// Domain models for Taskboard
///
/// # Models
///
/// - `user`: Accounts, roles and legacy task notes
/// - `project`: Projects with an owner and members
/// - `task`: Tasks scoped to a project
/// - `patch`: Tri-state field updates used by partial `PUT` bodies
///
/// References between entities (task → project, task → user,
/// project → users) are plain ids. Nothing enforces that the target still
/// exists; see `store::resolve` for how reads cope with that.

pub mod patch;
pub mod project;
pub mod task;
pub mod user;

use std::fmt;

/// A single invalid input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as seen on the wire
    pub field: &'static str,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}
