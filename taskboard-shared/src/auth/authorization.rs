/// Authorization core
///
/// A single pure decision function, [`authorize`], answers "may this actor
/// perform this action?" for every handler. It does no I/O: the caller loads
/// the target resource first (so a missing resource is a NotFound, decided
/// before this runs) and passes it in with the action.
///
/// # Decision table
///
/// | Action                          | Rule                                  |
/// |---------------------------------|---------------------------------------|
/// | Create project                  | allow                                 |
/// | Read project                    | owner or member                       |
/// | Update project                  | owner                                 |
/// | Delete project                  | owner **and** admin                   |
/// | Create / read / update task     | allow                                 |
/// | Delete task                     | admin                                 |
/// | List / block / activate / delete user | admin                           |
/// | Attach task note to a user      | allow                                 |
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{authorize, Action, Actor, Decision};
/// use taskboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let actor = Actor { id: Uuid::new_v4(), role: UserRole::Member };
/// assert_eq!(authorize(&actor, &Action::CreateTask), Decision::Allow);
/// assert!(authorize(&actor, &Action::DeleteTask).is_deny());
/// ```

use tracing::debug;
use uuid::Uuid;

use crate::models::{project::Project, user::UserRole};

/// Reason given for ownership denials
pub const NOT_AUTHORIZED: &str = "Not authorized";

/// Reason given for admin-only actions
pub const ADMIN_ONLY: &str = "Admin access required";

/// Reason given when a project is neither owned nor shared with the actor
pub const NOT_A_MEMBER: &str = "Not a member of this project";

/// The identity an action is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Something an actor wants to do, with the target where the rule needs it
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreateProject,
    ReadProject(&'a Project),
    UpdateProject(&'a Project),
    DeleteProject(&'a Project),
    CreateTask,
    ReadTask,
    UpdateTask,
    DeleteTask,
    ListUsers,
    BlockUser,
    ActivateUser,
    DeleteUser,
    AssignTaskNote,
}

impl Action<'_> {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateProject => "create_project",
            Action::ReadProject(_) => "read_project",
            Action::UpdateProject(_) => "update_project",
            Action::DeleteProject(_) => "delete_project",
            Action::CreateTask => "create_task",
            Action::ReadTask => "read_task",
            Action::UpdateTask => "update_task",
            Action::DeleteTask => "delete_task",
            Action::ListUsers => "list_users",
            Action::BlockUser => "block_user",
            Action::ActivateUser => "activate_user",
            Action::DeleteUser => "delete_user",
            Action::AssignTaskNote => "assign_task_note",
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        !self.is_allow()
    }
}

/// Error returned by [`require`] when access is denied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct AuthzError {
    /// Action that was refused
    pub action: &'static str,

    /// Human-readable reason
    pub reason: &'static str,
}

fn admin_only(actor: &Actor) -> Decision {
    if actor.is_admin() {
        Decision::Allow
    } else {
        Decision::Deny(ADMIN_ONLY)
    }
}

/// Decides whether `actor` may perform `action`
pub fn authorize(actor: &Actor, action: &Action<'_>) -> Decision {
    match action {
        Action::CreateProject => Decision::Allow,

        Action::ReadProject(project) => {
            if project.is_owner(actor.id) || project.is_member(actor.id) {
                Decision::Allow
            } else {
                Decision::Deny(NOT_A_MEMBER)
            }
        }

        Action::UpdateProject(project) => {
            if project.is_owner(actor.id) {
                Decision::Allow
            } else {
                Decision::Deny(NOT_AUTHORIZED)
            }
        }

        // The route is also behind the admin layer; both checks must pass.
        Action::DeleteProject(project) => {
            if project.is_owner(actor.id) && actor.is_admin() {
                Decision::Allow
            } else {
                Decision::Deny(NOT_AUTHORIZED)
            }
        }

        Action::CreateTask | Action::ReadTask | Action::UpdateTask => Decision::Allow,

        Action::DeleteTask => admin_only(actor),

        Action::ListUsers | Action::BlockUser | Action::ActivateUser | Action::DeleteUser => {
            admin_only(actor)
        }

        Action::AssignTaskNote => Decision::Allow,
    }
}

/// Like [`authorize`] but returns an error on denial
///
/// Denials are logged at debug level.
pub fn require(actor: &Actor, action: &Action<'_>) -> Result<(), AuthzError> {
    match authorize(actor, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            debug!(
                actor_id = %actor.id,
                role = actor.role.as_str(),
                action = action.name(),
                reason,
                "Authorization denied"
            );
            Err(AuthzError {
                action: action.name(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectStatus;
    use chrono::Utc;

    fn member() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: UserRole::Member,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
        }
    }

    fn project_owned_by(owner: &Actor, members: &[Uuid]) -> Project {
        let now = Utc::now();
        let mut member_ids = vec![owner.id];
        member_ids.extend_from_slice(members);

        Project {
            id: Uuid::new_v4(),
            name: "Alpha".to_string(),
            description: None,
            owner_id: owner.id,
            member_ids,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_anyone_creates_projects_and_tasks() {
        for actor in [member(), admin()] {
            assert!(authorize(&actor, &Action::CreateProject).is_allow());
            assert!(authorize(&actor, &Action::CreateTask).is_allow());
            assert!(authorize(&actor, &Action::ReadTask).is_allow());
            assert!(authorize(&actor, &Action::UpdateTask).is_allow());
            assert!(authorize(&actor, &Action::AssignTaskNote).is_allow());
        }
    }

    #[test]
    fn test_project_read_requires_owner_or_member() {
        let owner = member();
        let invited = member();
        let stranger = member();
        let project = project_owned_by(&owner, &[invited.id]);

        assert!(authorize(&owner, &Action::ReadProject(&project)).is_allow());
        assert!(authorize(&invited, &Action::ReadProject(&project)).is_allow());
        assert_eq!(
            authorize(&stranger, &Action::ReadProject(&project)),
            Decision::Deny(NOT_A_MEMBER)
        );
        // Admin role does not grant visibility
        assert!(authorize(&admin(), &Action::ReadProject(&project)).is_deny());
    }

    #[test]
    fn test_project_update_owner_only() {
        let owner = member();
        let invited = member();
        let project = project_owned_by(&owner, &[invited.id]);

        assert!(authorize(&owner, &Action::UpdateProject(&project)).is_allow());
        assert_eq!(
            authorize(&invited, &Action::UpdateProject(&project)),
            Decision::Deny(NOT_AUTHORIZED)
        );
        assert!(authorize(&admin(), &Action::UpdateProject(&project)).is_deny());
    }

    #[test]
    fn test_project_delete_needs_owner_and_admin() {
        let member_owner = member();
        let admin_owner = admin();
        let owned_by_member = project_owned_by(&member_owner, &[]);
        let owned_by_admin = project_owned_by(&admin_owner, &[]);

        assert!(authorize(&admin_owner, &Action::DeleteProject(&owned_by_admin)).is_allow());
        assert!(authorize(&member_owner, &Action::DeleteProject(&owned_by_member)).is_deny());
        assert!(authorize(&admin_owner, &Action::DeleteProject(&owned_by_member)).is_deny());
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [
            Action::DeleteTask,
            Action::ListUsers,
            Action::BlockUser,
            Action::ActivateUser,
            Action::DeleteUser,
        ] {
            assert!(authorize(&admin(), &action).is_allow(), "{}", action.name());
            assert_eq!(authorize(&member(), &action), Decision::Deny(ADMIN_ONLY));
        }
    }

    #[test]
    fn test_require_returns_error_with_reason() {
        let err = require(&member(), &Action::DeleteTask).unwrap_err();
        assert_eq!(err.action, "delete_task");
        assert_eq!(err.to_string(), ADMIN_ONLY);
        assert!(require(&admin(), &Action::DeleteTask).is_ok());
    }
}
