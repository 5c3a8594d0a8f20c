/// Entity store
///
/// The `Store` trait is the single persistence seam of the service. It is
/// constructed once at startup and shared as `Arc<dyn Store>`.
///
/// # Implementations
///
/// - `PgStore`: PostgreSQL through sqlx (production)
/// - `MemoryStore`: ordered maps behind a tokio `RwLock` (tests, local runs)
///
/// # Ownership guards
///
/// Writes that attach an entity to a parent (a project to a client, a task or
/// report to a project) take a `ParentGuard`. The store checks that the parent
/// exists and belongs to the guard's owner inside the same transaction (or
/// under the same write lock) as the write itself, so a rejected guard never
/// leaves a partial write behind.
///
/// # Example
///
/// ```no_run
/// use seodesk_shared::store::{memory::MemoryStore, ParentGuard, Store};
/// use seodesk_shared::models::project::{CreateProject, ProjectStatus};
/// use chrono::Utc;
///
/// # async fn example(owner: i32, client_id: i32) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let project = store
///     .create_project(
///         CreateProject {
///             name: "Acme SEO".to_string(),
///             website: "https://acme.test".to_string(),
///             client_id,
///             start_date: Utc::now(),
///             end_date: None,
///             status: ProjectStatus::InProgress,
///             description: None,
///             attachments: None,
///             created_by: owner,
///         },
///         ParentGuard::client(client_id, owner),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::activity_log::{ActivityLog, NewActivityLog};
use crate::models::client::{Client, CreateClient, UpdateClient};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::report::{CreateReport, Report, UpdateReport};
use crate::models::session::Session;
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::models::Id;

pub mod memory;
pub mod postgres;

/// Parent entity an ownership guard refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Client(Id),
    Project(Id),
}

/// Requirement that a parent exists and belongs to `owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentGuard {
    pub parent: ParentRef,
    pub owner: Id,
}

impl ParentGuard {
    pub fn client(client_id: Id, owner: Id) -> Self {
        Self {
            parent: ParentRef::Client(client_id),
            owner,
        }
    }

    pub fn project(project_id: Id, owner: Id) -> Self {
        Self {
            parent: ParentRef::Project(project_id),
            owner,
        }
    }

    /// Checks the parent's actual owner (`None` when the parent is missing)
    pub fn check(&self, actual_owner: Option<Id>) -> Result<(), StoreError> {
        match actual_owner {
            Some(owner) if owner == self.owner => Ok(()),
            _ => Err(StoreError::GuardRejected(self.parent)),
        }
    }
}

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// A referenced user does not exist
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    /// Parent missing or owned by someone else
    #[error("ownership guard rejected for {0:?}")]
    GuardRejected(ParentRef),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default();

            if db_err.is_unique_violation() {
                match constraint {
                    "users_username_key" => return StoreError::Duplicate("username"),
                    "users_email_key" => return StoreError::Duplicate("email"),
                    _ => {}
                }
            }

            if db_err.is_foreign_key_violation() {
                let field = if constraint.contains("assigned_to") {
                    "assignedTo"
                } else if constraint.contains("user_id") {
                    "userId"
                } else {
                    "createdBy"
                };
                return StoreError::MissingReference(field);
            }
        }

        StoreError::Database(err)
    }
}

/// Typed persistence for every entity of the service
///
/// List operations return rows newest first (`created_at` descending, ties
/// broken by descending ID) unless stated otherwise. Updates are partial
/// merges and never change `id`, `created_by` or `created_at`. Deletes never
/// cascade.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    // Users

    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `Duplicate` if the username or email is taken
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: Id, changes: UpdateUser) -> Result<Option<User>, StoreError>;

    // Sessions

    async fn create_session(&self, session: Session) -> Result<Session, StoreError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Removes sessions expired at `now`, returning how many were dropped
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    // Clients

    async fn get_client(&self, id: Id) -> Result<Option<Client>, StoreError>;

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    async fn list_clients_by_owner(&self, owner: Id) -> Result<Vec<Client>, StoreError>;

    async fn create_client(&self, data: CreateClient) -> Result<Client, StoreError>;

    async fn update_client(
        &self,
        id: Id,
        changes: UpdateClient,
    ) -> Result<Option<Client>, StoreError>;

    async fn delete_client(&self, id: Id) -> Result<bool, StoreError>;

    // Projects

    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn list_projects_by_owner(&self, owner: Id) -> Result<Vec<Project>, StoreError>;

    async fn list_projects_by_client(&self, client_id: Id) -> Result<Vec<Project>, StoreError>;

    /// Inserts a project after checking `guard` atomically with the insert
    async fn create_project(
        &self,
        data: CreateProject,
        guard: ParentGuard,
    ) -> Result<Project, StoreError>;

    /// Merges `changes`; when `guard` is given it is checked before the write
    async fn update_project(
        &self,
        id: Id,
        changes: UpdateProject,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Project>, StoreError>;

    async fn delete_project(&self, id: Id) -> Result<bool, StoreError>;

    // Tasks

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn list_tasks_by_owner(&self, owner: Id) -> Result<Vec<Task>, StoreError>;

    async fn list_tasks_by_project(&self, project_id: Id) -> Result<Vec<Task>, StoreError>;

    async fn list_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError>;

    /// Pending tasks due within `[start, end]`, ordered by due date ascending
    async fn list_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError>;

    async fn create_task(&self, data: CreateTask, guard: ParentGuard) -> Result<Task, StoreError>;

    async fn update_task(
        &self,
        id: Id,
        changes: UpdateTask,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, id: Id) -> Result<bool, StoreError>;

    // Reports

    async fn get_report(&self, id: Id) -> Result<Option<Report>, StoreError>;

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;

    async fn list_reports_by_project(&self, project_id: Id) -> Result<Vec<Report>, StoreError>;

    async fn create_report(
        &self,
        data: CreateReport,
        guard: ParentGuard,
    ) -> Result<Report, StoreError>;

    async fn update_report(
        &self,
        id: Id,
        changes: UpdateReport,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Report>, StoreError>;

    async fn delete_report(&self, id: Id) -> Result<bool, StoreError>;

    // Activity

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError>;

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityLog>, StoreError>;

    async fn recent_activity_for_user(
        &self,
        user_id: Id,
        limit: usize,
    ) -> Result<Vec<ActivityLog>, StoreError>;

    // Dashboard counters, scoped to the creating user

    async fn count_projects_by_status(
        &self,
        owner: Id,
        status: ProjectStatus,
    ) -> Result<u64, StoreError>;

    async fn count_tasks_by_status(&self, owner: Id, status: TaskStatus)
        -> Result<u64, StoreError>;

    /// Pending tasks whose due date is strictly before `now`
    async fn count_overdue_tasks(&self, owner: Id, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Distinct clients of `owner` with at least one in-progress project
    async fn count_active_clients(&self, owner: Id) -> Result<u64, StoreError>;
}
