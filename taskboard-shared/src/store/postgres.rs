//! PostgreSQL entity store.
//!
//! Schema lives in `migrations/`. There are no foreign keys between the
//! three tables; references are plain UUID columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, types::Json};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    check_new_user, check_required, parse_enum, EntityStore, StoreError, StoreResult, MAX_TITLE_LEN,
};
use crate::db::pool::health_check;
use crate::models::{
    project::{CreateProject, Project, ProjectStatus, ProjectUpdate},
    task::{CreateTask, Task, TaskPriority, TaskStatus, TaskUpdate},
    user::{CreateUser, TaskNote, User, UserRole},
};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, phone, role, is_active, task_notes, created_at, updated_at";

const PROJECT_COLUMNS: &str =
    "id, name, description, owner_id, member_ids, status, created_at, updated_at";

const TASK_COLUMNS: &str = "id, title, description, project_id, assigned_to, status, priority, \
     deadline, created_at, updated_at";

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for check_violation
const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE for invalid_text_representation (bad enum literal)
const INVALID_TEXT: &str = "22P02";

/// SQLSTATE for string_data_right_truncation (value longer than the column)
const STRING_TOO_LONG: &str = "22001";

/// Row shape of the `users` table
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    phone: Option<String>,
    role: UserRole,
    is_active: bool,
    task_notes: Json<Vec<TaskNote>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            tasks: row.task_notes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of [`EntityStore`]
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint-related database errors onto store errors
fn map_write_error(err: sqlx::Error, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(CHECK_VIOLATION) | Some(INVALID_TEXT) | Some(STRING_TOO_LONG) => {
                return StoreError::Constraint {
                    field,
                    message: db.message().to_string(),
                };
            }
            _ => {}
        }
    }

    StoreError::Database(err)
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        check_new_user(&data)?;
        let email = data.email.trim().to_string();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, password_hash, name, phone, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&data.password_hash)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
            );

            if duplicate {
                StoreError::DuplicateEmail {
                    email: email.clone(),
                }
            } else {
                map_write_error(e, "name")
            }
        })?;

        debug!(user_id = %row.id, "User inserted");
        Ok(row.into())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn push_task_note(&self, id: Uuid, note: TaskNote) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET task_notes = task_notes || $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(vec![note]))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, data), fields(owner_id = %data.owner_id))]
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        check_required("name", &data.name, MAX_TITLE_LEN)?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (id, name, description, owner_id, member_ids)
             VALUES ($1, $2, $3, $4, ARRAY[$4]::uuid[])
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "name"))?;

        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn find_projects(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE owner_id = $1 OR $1 = ANY(member_ids)
             ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> StoreResult<Option<Project>> {
        check_required("name", &update.name, MAX_TITLE_LEN)?;
        let status: ProjectStatus = parse_enum("status", &update.status)?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET name = $2, description = $3, status = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "status"))?;

        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
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

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks
                (id, title, description, project_id, assigned_to, status, priority, deadline)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(status)
        .bind(priority)
        .bind(data.deadline)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "title"))?;

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at, id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>> {
        check_required("title", &update.title, MAX_TITLE_LEN)?;
        let status: TaskStatus = parse_enum("status", &update.status)?;
        let priority: TaskPriority = parse_enum("priority", &update.priority)?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, status = $4, assigned_to = $5,
                 deadline = $6, priority = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(status)
        .bind(update.assigned_to)
        .bind(update.deadline)
        .bind(priority)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "title"))?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
