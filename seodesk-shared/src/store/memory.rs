/// In-memory store
///
/// All tables live behind one tokio `RwLock`. Reads share the lock; every
/// write, including its ownership guard and reference checks, runs under a
/// single write lock, which gives the same all-or-nothing behavior as a
/// PostgreSQL transaction.
///
/// Used by the integration tests and for running the API without a database
/// (`STORE_BACKEND=memory`). Data is lost when the process exits.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ParentGuard, ParentRef, Store, StoreError};
use crate::models::activity_log::{ActivityLog, NewActivityLog};
use crate::models::client::{Client, CreateClient, UpdateClient};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::report::{CreateReport, Report, UpdateReport};
use crate::models::session::Session;
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::models::{sort_newest_first, Id};

/// Monotonic row ID generator, mirroring a `SERIAL` column
#[derive(Debug, Default)]
struct Sequence(Id);

impl Sequence {
    fn next(&mut self) -> Id {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Id, User>,
    user_seq: Sequence,
    sessions: HashMap<Uuid, Session>,
    clients: BTreeMap<Id, Client>,
    client_seq: Sequence,
    projects: BTreeMap<Id, Project>,
    project_seq: Sequence,
    tasks: BTreeMap<Id, Task>,
    task_seq: Sequence,
    reports: BTreeMap<Id, Report>,
    report_seq: Sequence,
    activity: BTreeMap<Id, ActivityLog>,
    activity_seq: Sequence,
}

impl Tables {
    fn enforce(&self, guard: &ParentGuard) -> Result<(), StoreError> {
        let owner = match guard.parent {
            ParentRef::Client(id) => self.clients.get(&id).map(|c| c.created_by),
            ParentRef::Project(id) => self.projects.get(&id).map(|p| p.created_by),
        };
        guard.check(owner)
    }

    fn require_user(&self, id: Id, field: &'static str) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(field))
        }
    }
}

/// Newest-first copy of the rows matching `filter`
fn select<T, F>(rows: &BTreeMap<Id, T>, filter: F) -> Vec<T>
where
    T: Clone + crate::models::Record,
    F: Fn(&T) -> bool,
{
    let mut selected: Vec<T> = rows.values().filter(|row| filter(row)).cloned().collect();
    sort_newest_first(&mut selected);
    selected
}

fn count<T, F>(rows: &BTreeMap<Id, T>, filter: F) -> u64
where
    F: Fn(&T) -> bool,
{
    rows.values().filter(|row| filter(row)).count() as u64
}

/// Store holding every table in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if tables.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let user = User {
            id: tables.user_seq.next(),
            role: data.role_or_default().to_string(),
            username: data.username,
            password_hash: data.password_hash,
            email: data.email,
            full_name: data.full_name,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Id, changes: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate("email"));
            }
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn create_session(&self, session: Session) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_user(session.user_id, "userId")?;
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn get_client(&self, id: Id) -> Result<Option<Client>, StoreError> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(select(&self.tables.read().await.clients, |_| true))
    }

    async fn list_clients_by_owner(&self, owner: Id) -> Result<Vec<Client>, StoreError> {
        Ok(select(&self.tables.read().await.clients, |c| c.created_by == owner))
    }

    async fn create_client(&self, data: CreateClient) -> Result<Client, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_user(data.created_by, "createdBy")?;

        let client = Client {
            id: tables.client_seq.next(),
            name: data.name,
            contact_person: data.contact_person,
            email: data.email,
            phone: data.phone,
            website: data.website,
            notes: data.notes,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        tables.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(
        &self,
        id: Id,
        changes: UpdateClient,
    ) -> Result<Option<Client>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.clients.get_mut(&id).map(|client| {
            changes.apply(client);
            client.clone()
        }))
    }

    async fn delete_client(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.clients.remove(&id).is_some())
    }

    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(select(&self.tables.read().await.projects, |_| true))
    }

    async fn list_projects_by_owner(&self, owner: Id) -> Result<Vec<Project>, StoreError> {
        Ok(select(&self.tables.read().await.projects, |p| p.created_by == owner))
    }

    async fn list_projects_by_client(&self, client_id: Id) -> Result<Vec<Project>, StoreError> {
        Ok(select(&self.tables.read().await.projects, |p| p.client_id == client_id))
    }

    async fn create_project(
        &self,
        data: CreateProject,
        guard: ParentGuard,
    ) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        tables.enforce(&guard)?;
        tables.require_user(data.created_by, "createdBy")?;

        let project = Project {
            id: tables.project_seq.next(),
            name: data.name,
            website: data.website,
            client_id: data.client_id,
            start_date: data.start_date,
            end_date: data.end_date,
            status: data.status,
            description: data.description,
            attachments: data.attachments,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: Id,
        changes: UpdateProject,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&id) {
            return Ok(None);
        }
        if let Some(guard) = &guard {
            tables.enforce(guard)?;
        }

        Ok(tables.projects.get_mut(&id).map(|project| {
            changes.apply(project);
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.projects.remove(&id).is_some())
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(select(&self.tables.read().await.tasks, |_| true))
    }

    async fn list_tasks_by_owner(&self, owner: Id) -> Result<Vec<Task>, StoreError> {
        Ok(select(&self.tables.read().await.tasks, |t| t.created_by == owner))
    }

    async fn list_tasks_by_project(&self, project_id: Id) -> Result<Vec<Task>, StoreError> {
        Ok(select(&self.tables.read().await.tasks, |t| t.project_id == project_id))
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        Ok(select(&self.tables.read().await.tasks, |t| t.status == status))
    }

    async fn list_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let mut due: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| t.due_date.is_some_and(|d| d >= start && d <= end))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }

    async fn create_task(&self, data: CreateTask, guard: ParentGuard) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        tables.enforce(&guard)?;
        tables.require_user(data.created_by, "createdBy")?;
        if let Some(assignee) = data.assigned_to {
            tables.require_user(assignee, "assignedTo")?;
        }

        let task = Task {
            id: tables.task_seq.next(),
            title: data.title,
            description: data.description,
            project_id: data.project_id,
            assigned_to: data.assigned_to,
            due_date: data.due_date,
            priority: data.priority,
            status: data.status,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Id,
        changes: UpdateTask,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Ok(None);
        }
        if let Some(guard) = &guard {
            tables.enforce(guard)?;
        }
        if let Some(Some(assignee)) = changes.assigned_to {
            tables.require_user(assignee, "assignedTo")?;
        }

        Ok(tables.tasks.get_mut(&id).map(|task| {
            changes.apply(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn get_report(&self, id: Id) -> Result<Option<Report>, StoreError> {
        Ok(self.tables.read().await.reports.get(&id).cloned())
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(select(&self.tables.read().await.reports, |_| true))
    }

    async fn list_reports_by_project(&self, project_id: Id) -> Result<Vec<Report>, StoreError> {
        Ok(select(&self.tables.read().await.reports, |r| r.project_id == project_id))
    }

    async fn create_report(
        &self,
        data: CreateReport,
        guard: ParentGuard,
    ) -> Result<Report, StoreError> {
        let mut tables = self.tables.write().await;
        tables.enforce(&guard)?;
        tables.require_user(data.created_by, "createdBy")?;

        let report = Report {
            id: tables.report_seq.next(),
            title: data.title,
            project_id: data.project_id,
            content: data.content,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        tables.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn update_report(
        &self,
        id: Id,
        changes: UpdateReport,
        guard: Option<ParentGuard>,
    ) -> Result<Option<Report>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.reports.contains_key(&id) {
            return Ok(None);
        }
        if let Some(guard) = &guard {
            tables.enforce(guard)?;
        }

        Ok(tables.reports.get_mut(&id).map(|report| {
            changes.apply(report);
            report.clone()
        }))
    }

    async fn delete_report(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.reports.remove(&id).is_some())
    }

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_user(entry.user_id, "userId")?;

        let log = ActivityLog {
            id: tables.activity_seq.next(),
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: Utc::now(),
        };
        tables.activity.insert(log.id, log.clone());
        Ok(log)
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityLog>, StoreError> {
        let mut logs = select(&self.tables.read().await.activity, |_| true);
        logs.truncate(limit);
        Ok(logs)
    }

    async fn recent_activity_for_user(
        &self,
        user_id: Id,
        limit: usize,
    ) -> Result<Vec<ActivityLog>, StoreError> {
        let mut logs = select(&self.tables.read().await.activity, |l| l.user_id == user_id);
        logs.truncate(limit);
        Ok(logs)
    }

    async fn count_projects_by_status(
        &self,
        owner: Id,
        status: ProjectStatus,
    ) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(count(&tables.projects, |p| {
            p.created_by == owner && p.status == status
        }))
    }

    async fn count_tasks_by_status(
        &self,
        owner: Id,
        status: TaskStatus,
    ) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(count(&tables.tasks, |t| t.created_by == owner && t.status == status))
    }

    async fn count_overdue_tasks(&self, owner: Id, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(count(&tables.tasks, |t| t.created_by == owner && t.is_overdue(now)))
    }

    async fn count_active_clients(&self, owner: Id) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        let active: HashSet<Id> = tables
            .projects
            .values()
            .filter(|p| p.status == ProjectStatus::InProgress)
            .map(|p| p.client_id)
            .filter(|client_id| {
                tables
                    .clients
                    .get(client_id)
                    .is_some_and(|c| c.created_by == owner)
            })
            .collect();
        Ok(active.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(CreateUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                email: format!("{}@agency.test", username),
                full_name: username.to_uppercase(),
                role: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "alice").await;
        let b = seed_user(&store, "bob").await;
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let dup_name = store
            .create_user(CreateUser {
                username: "alice".to_string(),
                password_hash: "hash".to_string(),
                email: "other@agency.test".to_string(),
                full_name: "Other".to_string(),
                role: None,
            })
            .await;
        assert!(matches!(dup_name, Err(StoreError::Duplicate("username"))));

        let dup_email = store
            .create_user(CreateUser {
                username: "alice2".to_string(),
                password_hash: "hash".to_string(),
                email: "alice@agency.test".to_string(),
                full_name: "Other".to_string(),
                role: None,
            })
            .await;
        assert!(matches!(dup_email, Err(StoreError::Duplicate("email"))));
    }

    #[tokio::test]
    async fn test_client_requires_existing_creator() {
        let store = MemoryStore::new();
        let result = store
            .create_client(CreateClient {
                name: "Ghost".to_string(),
                contact_person: "Nobody".to_string(),
                email: "ghost@test".to_string(),
                phone: None,
                website: None,
                notes: None,
                created_by: 99,
            })
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference("createdBy"))));
    }
}
