//! In-memory entity store.
//!
//! Used by the test suites and for running the API without a database
//! (`STORE_BACKEND=memory`). Applies the same constraints as the PostgreSQL
//! schema: case-insensitive unique emails, non-empty names/titles and the
//! enum sets for status and priority.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use tracing::instrument;
use uuid::Uuid;

use super::{
    check_new_user, check_required, parse_enum, EntityStore, StoreError, StoreResult, MAX_TITLE_LEN,
};
use crate::models::{
    project::{CreateProject, Project, ProjectStatus, ProjectUpdate},
    task::{CreateTask, Task, TaskPriority, TaskStatus, TaskUpdate},
    user::{normalize_email, CreateUser, TaskNote, User},
};

/// In-memory implementation of [`EntityStore`].
///
/// Uses `DashMap` per collection so concurrent requests never block each
/// other on unrelated documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// Normalized email → user id, for atomic uniqueness checks
    emails: DashMap<String, Uuid>,
    projects: DashMap<Uuid, Project>,
    tasks: DashMap<Uuid, Task>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store wrapped in Arc
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

fn collect_sorted<T: Clone>(
    values: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid),
) -> Vec<T> {
    let mut values: Vec<T> = values.collect();
    values.sort_by_key(|v| key(v));
    values
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        check_new_user(&data)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email.trim().to_string(),
            password_hash: data.password_hash,
            name: data.name,
            phone: data.phone,
            role: data.role,
            is_active: true,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        match self.emails.entry(normalize_email(&user.email)) {
            Entry::Occupied(_) => {
                return Err(StoreError::DuplicateEmail { email: user.email });
            }
            Entry::Vacant(entry) => {
                entry.insert(user.id);
            }
        }

        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = match self.emails.get(&normalize_email(email)) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };

        self.find_user(id).await
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.value().clone()))
            .collect())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(collect_sorted(
            self.users.iter().map(|u| u.value().clone()),
            |u| (u.created_at, u.id),
        ))
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.is_active = active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn push_task_note(&self, id: Uuid, note: TaskNote) -> StoreResult<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.tasks.push(note);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.emails.remove(&normalize_email(&user.email));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, data), fields(owner_id = %data.owner_id))]
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        check_required("name", &data.name, MAX_TITLE_LEN)?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            member_ids: vec![data.owner_id],
            status: ProjectStatus::default(),
            created_at: now,
            updated_at: now,
        };

        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.projects.get(&id).map(|p| p.value().clone()))
    }

    async fn find_projects(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.projects.get(id).map(|p| p.value().clone()))
            .collect())
    }

    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(collect_sorted(
            self.projects
                .iter()
                .filter(|p| p.is_owner(user_id) || p.is_member(user_id))
                .map(|p| p.value().clone()),
            |p| (p.created_at, p.id),
        ))
    }

    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> StoreResult<Option<Project>> {
        check_required("name", &update.name, MAX_TITLE_LEN)?;
        let status: ProjectStatus = parse_enum("status", &update.status)?;

        Ok(self.projects.get_mut(&id).map(|mut project| {
            project.name = update.name;
            project.description = update.description;
            project.status = status;
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.projects.remove(&id).is_some())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        check_required("title", &data.title, MAX_TITLE_LEN)?;

        let status = match data.status.as_deref() {
            Some(raw) => parse_enum::<TaskStatus>("status", raw)?,
            None => TaskStatus::default(),
        };
        let priority = match data.priority.as_deref() {
            Some(raw) => parse_enum::<TaskPriority>("priority", raw)?,
            None => TaskPriority::default(),
        };

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            project_id: data.project_id,
            assigned_to: data.assigned_to,
            status,
            priority,
            deadline: data.deadline,
            created_at: now,
            updated_at: now,
        };

        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|t| t.value().clone()))
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(collect_sorted(
            self.tasks.iter().map(|t| t.value().clone()),
            |t| (t.created_at, t.id),
        ))
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(collect_sorted(
            self.tasks
                .iter()
                .filter(|t| t.project_id == project_id)
                .map(|t| t.value().clone()),
            |t| (t.created_at, t.id),
        ))
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>> {
        check_required("title", &update.title, MAX_TITLE_LEN)?;
        let status: TaskStatus = parse_enum("status", &update.status)?;
        let priority: TaskPriority = parse_enum("priority", &update.priority)?;

        Ok(self.tasks.get_mut(&id).map(|mut task| {
            task.title = update.title;
            task.description = update.description;
            task.status = status;
            task.assigned_to = update.assigned_to;
            task.deadline = update.deadline;
            task.priority = priority;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tasks.remove(&id).is_some())
    }
}
