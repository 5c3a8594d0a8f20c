/// PostgreSQL-backed store
///
/// Thin adapter from the `Store` trait to the per-table queries in `models`.
/// Guarded writes and partial updates run in a transaction: the parent row is
/// read `FOR SHARE` and the target row `FOR UPDATE`, so the ownership check,
/// the merge and the write see one consistent state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{ParentGuard, ParentRef, Store, StoreError};
use crate::db::pool::health_check;
use crate::models::activity_log::{ActivityLog, NewActivityLog};
use crate::models::client::{Client, CreateClient, UpdateClient};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::report::{CreateReport, Report, UpdateReport};
use crate::models::session::Session;
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::models::Id;

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Locks the guard's parent row and checks its owner
async fn enforce(conn: &mut PgConnection, guard: &ParentGuard) -> Result<(), StoreError> {
    let owner = match guard.parent {
        ParentRef::Client(id) => Client::lock_owner(&mut *conn, id).await?,
        ParentRef::Project(id) => Project::lock_owner(&mut *conn, id).await?,
    };

    if let Err(e) = guard.check(owner) {
        debug!(parent = ?guard.parent, owner = guard.owner, "Ownership guard rejected write");
        return Err(e);
    }

    Ok(())
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, &data).await?)
    }

    async fn update_user(&self, id: Id, changes: UpdateUser) -> Result<Option<User>, StoreError> {
        Ok(User::update(&self.pool, id, &changes).await?)
    }

    async fn create_session(&self, session: Session) -> Result<Session, StoreError> {
        Ok(Session::insert(&self.pool, &session).await?)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(Session::find_by_id(&self.pool, id).await?)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Session::delete(&self.pool, id).await?)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(Session::delete_expired(&self.pool, now).await?)
    }

    async fn get_client(&self, id: Id) -> Result<Option<Client>, StoreError> {
        Ok(Client::find_by_id(&self.pool, id).await?)
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(Client::list(&self.pool).await?)
    }

    async fn list_clients_by_owner(&self, owner: Id) -> Result<Vec<Client>, StoreError> {
        Ok(Client::list_by_owner(&self.pool, owner).await?)
    }

    async fn create_client(&self, data: CreateClient) -> Result<Client, StoreError> {
        Ok(Client::create(&self.pool, &data).await?)
    }

    async fn update_client(
        &self,
        id: Id,
        changes: UpdateClient,
    ) -> Result<Option<Client>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut client) = Client::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        changes.apply(&mut client);
        let saved = Client::save(&mut *tx, &client).await?;

        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_client(&self, id: Id) -> Result<bool, StoreError> {
        Ok(Client::delete(&self.pool, id).await?)
    }

    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(Project::list(&self.pool).await?)
    }

    async fn list_projects_by_owner(&self, owner: Id) -> Result<Vec<Project>, StoreError> {
        Ok(Project::list_by_owner(&self.pool, owner).await?)
    }

    async fn list_projects_by_client(&self, client_id: Id) -> Result<Vec<Project>, StoreError> {
        Ok(Project::list_by_client(&self.pool, client_id).await?)
    }

    async fn create_project(
        &self,
        data: CreateProject,
        guard: ParentGuard,
    ) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;

        enforce(&mut tx, &guard).await?;
        let project = Project::create(&mut *tx, &data).await?;

        tx.commit().await?;
        Ok(project)
    }

    async fn update_project(
        &self,
        id: Id,
        changes: UpdateProject,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Project>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut project) = Project::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        if let Some(guard) = &guard {
            enforce(&mut tx, guard).await?;
        }
        changes.apply(&mut project);
        let saved = Project::save(&mut *tx, &project).await?;

        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_project(&self, id: Id) -> Result<bool, StoreError> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list(&self.pool).await?)
    }

    async fn list_tasks_by_owner(&self, owner: Id) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_owner(&self.pool, owner).await?)
    }

    async fn list_tasks_by_project(&self, project_id: Id) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_status(&self.pool, status).await?)
    }

    async fn list_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_due_between(&self.pool, start, end).await?)
    }

    async fn create_task(&self, data: CreateTask, guard: ParentGuard) -> Result<Task, StoreError> {
        let mut tx = self.pool.begin().await?;

        enforce(&mut tx, &guard).await?;
        let task = Task::create(&mut *tx, &data).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Id,
        changes: UpdateTask,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Task>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut task) = Task::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        if let Some(guard) = &guard {
            enforce(&mut tx, guard).await?;
        }
        changes.apply(&mut task);
        let saved = Task::save(&mut *tx, &task).await?;

        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_task(&self, id: Id) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn get_report(&self, id: Id) -> Result<Option<Report>, StoreError> {
        Ok(Report::find_by_id(&self.pool, id).await?)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(Report::list(&self.pool).await?)
    }

    async fn list_reports_by_project(&self, project_id: Id) -> Result<Vec<Report>, StoreError> {
        Ok(Report::list_by_project(&self.pool, project_id).await?)
    }

    async fn create_report(
        &self,
        data: CreateReport,
        guard: ParentGuard,
    ) -> Result<Report, StoreError> {
        let mut tx = self.pool.begin().await?;

        enforce(&mut tx, &guard).await?;
        let report = Report::create(&mut *tx, &data).await?;

        tx.commit().await?;
        Ok(report)
    }

    async fn update_report(
        &self,
        id: Id,
        changes: UpdateReport,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Report>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut report) = Report::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        if let Some(guard) = &guard {
            enforce(&mut tx, guard).await?;
        }
        changes.apply(&mut report);
        let saved = Report::save(&mut *tx, &report).await?;

        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_report(&self, id: Id) -> Result<bool, StoreError> {
        Ok(Report::delete(&self.pool, id).await?)
    }

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        Ok(ActivityLog::append(&self.pool, &entry).await?)
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityLog>, StoreError> {
        Ok(ActivityLog::recent(&self.pool, to_limit(limit)).await?)
    }

    async fn recent_activity_for_user(
        &self,
        user_id: Id,
        limit: usize,
    ) -> Result<Vec<ActivityLog>, StoreError> {
        Ok(ActivityLog::recent_for_user(&self.pool, user_id, to_limit(limit)).await?)
    }

    async fn count_projects_by_status(
        &self,
        owner: Id,
        status: ProjectStatus,
    ) -> Result<u64, StoreError> {
        let count = Project::count_by_status(&self.pool, owner, status).await?;
        Ok(to_count(count))
    }

    async fn count_tasks_by_status(
        &self,
        owner: Id,
        status: TaskStatus,
    ) -> Result<u64, StoreError> {
        let count = Task::count_by_status(&self.pool, owner, status).await?;
        Ok(to_count(count))
    }

    async fn count_overdue_tasks(&self, owner: Id, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let count = Task::count_overdue(&self.pool, owner, now).await?;
        Ok(to_count(count))
    }

    async fn count_active_clients(&self, owner: Id) -> Result<u64, StoreError> {
        let count = Client::count_active_by_owner(&self.pool, owner).await?;
        Ok(to_count(count))
    }
}
