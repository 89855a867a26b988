//! Orphan-tolerant read path.
//!
//! Nothing in the store enforces references, so any id held by a project or
//! task may point at a deleted record. Reads must still succeed:
//!
//! - a missing user (project owner, project member, task assignee) resolves
//!   to [`UserRef::unknown`] with the original id kept
//! - a missing project resolves to `project: null` on the task view
//! - member lists are rendered as stored, dangling entries included
//!
//! Resolution never fails because of a dangling reference. Errors returned
//! from here come from the backend itself.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::{EntityStore, StoreResult};
use crate::models::{
    project::{Project, ProjectRef, ProjectView},
    task::{Task, TaskView},
    user::UserRef,
};

/// Loads the users behind `ids` in one round trip, keyed by id
async fn user_refs<S>(store: &S, ids: HashSet<Uuid>) -> StoreResult<HashMap<Uuid, UserRef>>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<Uuid> = ids.into_iter().collect();
    let users = store.find_users(&ids).await?;

    Ok(users.into_iter().map(|u| (u.id, u.summary())).collect())
}

fn lookup(refs: &HashMap<Uuid, UserRef>, id: Uuid) -> UserRef {
    refs.get(&id).cloned().unwrap_or_else(|| UserRef::unknown(id))
}

fn to_project_view(project: Project, refs: &HashMap<Uuid, UserRef>) -> ProjectView {
    ProjectView {
        id: project.id,
        owner: lookup(refs, project.owner_id),
        members: project.member_ids.iter().map(|id| lookup(refs, *id)).collect(),
        name: project.name,
        description: project.description,
        status: project.status,
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

/// Resolves owner and members for a batch of projects
pub async fn project_views<S>(store: &S, projects: Vec<Project>) -> StoreResult<Vec<ProjectView>>
where
    S: EntityStore + ?Sized,
{
    let ids: HashSet<Uuid> = projects
        .iter()
        .flat_map(|p| std::iter::once(p.owner_id).chain(p.member_ids.iter().copied()))
        .collect();
    let refs = user_refs(store, ids).await?;

    Ok(projects
        .into_iter()
        .map(|p| to_project_view(p, &refs))
        .collect())
}

/// Resolves owner and members for one project
pub async fn project_view<S>(store: &S, project: Project) -> StoreResult<ProjectView>
where
    S: EntityStore + ?Sized,
{
    let mut views = project_views(store, vec![project]).await?;
    Ok(views.remove(0))
}

/// Resolves project and assignee for a batch of tasks
pub async fn task_views<S>(store: &S, tasks: Vec<Task>) -> StoreResult<Vec<TaskView>>
where
    S: EntityStore + ?Sized,
{
    let user_ids: HashSet<Uuid> = tasks.iter().filter_map(|t| t.assigned_to).collect();
    let refs = user_refs(store, user_ids).await?;

    let project_ids: Vec<Uuid> = tasks
        .iter()
        .map(|t| t.project_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let projects: HashMap<Uuid, ProjectRef> = store
        .find_projects(&project_ids)
        .await?
        .iter()
        .map(|p| (p.id, ProjectRef::from(p)))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            id: task.id,
            project: projects.get(&task.project_id).cloned(),
            assigned_to: task.assigned_to.map(|id| lookup(&refs, id)),
            title: task.title,
            description: task.description,
            project_id: task.project_id,
            status: task.status,
            priority: task.priority,
            deadline: task.deadline,
            created_at: task.created_at,
            updated_at: task.updated_at,
        })
        .collect())
}

/// Resolves project and assignee for one task
pub async fn task_view<S>(store: &S, task: Task) -> StoreResult<TaskView>
where
    S: EntityStore + ?Sized,
{
    let mut views = task_views(store, vec![task]).await?;
    Ok(views.remove(0))
}
