/// Ownership-based access control
///
/// Every entity has a single owner. The rules:
///
/// - **Client**: owned by its `created_by`
/// - **Project**: owned by its own `created_by`, so a project stays reachable
///   after its client is deleted
/// - **Task / Report**: owned by the owner of the parent project; the row's
///   own `created_by` is not consulted
///
/// A missing resource (or a missing parent project) is `NotFound`; an existing
/// resource with another owner is `Forbidden`. Existence is always decided
/// before ownership.
///
/// # Example
///
/// ```no_run
/// use seodesk_shared::auth::authorization::{authorize_task, AuthzError};
/// use seodesk_shared::store::Store;
///
/// # async fn example(store: &dyn Store, user_id: i32) -> Result<(), AuthzError> {
/// let task = authorize_task(store, user_id, 17).await?;
/// println!("{} may edit {}", user_id, task.title);
/// # Ok(())
/// # }
/// ```

use crate::models::activity_log::EntityType;
use crate::models::client::Client;
use crate::models::project::Project;
use crate::models::report::Report;
use crate::models::task::Task;
use crate::models::Id;
use crate::store::{Store, StoreError};

/// Authorization error
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The resource, or the parent it is authorized through, does not exist
    #[error("{} not found", .0.label())]
    NotFound(EntityType),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fails with `Forbidden` unless `user_id` is the owner
pub fn require_ownership(user_id: Id, owner: Id) -> Result<(), AuthzError> {
    if user_id != owner {
        return Err(AuthzError::Forbidden);
    }

    Ok(())
}

/// Owner of a task, resolved through its parent project
///
/// Returns `None` when the parent project no longer exists.
pub async fn effective_task_owner(store: &dyn Store, task: &Task) -> Result<Option<Id>, AuthzError> {
    Ok(store
        .get_project(task.project_id)
        .await?
        .map(|project| project.created_by))
}

/// Owner of a report, resolved through its parent project
pub async fn effective_report_owner(
    store: &dyn Store,
    report: &Report,
) -> Result<Option<Id>, AuthzError> {
    Ok(store
        .get_project(report.project_id)
        .await?
        .map(|project| project.created_by))
}

/// Loads a client the user owns
pub async fn authorize_client(store: &dyn Store, user_id: Id, id: Id) -> Result<Client, AuthzError> {
    let client = store
        .get_client(id)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Client))?;

    require_ownership(user_id, client.created_by)?;
    Ok(client)
}

/// Loads a project the user owns
pub async fn authorize_project(
    store: &dyn Store,
    user_id: Id,
    id: Id,
) -> Result<Project, AuthzError> {
    let project = store
        .get_project(id)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Project))?;

    require_ownership(user_id, project.created_by)?;
    Ok(project)
}

/// Loads a task whose parent project the user owns
pub async fn authorize_task(store: &dyn Store, user_id: Id, id: Id) -> Result<Task, AuthzError> {
    let task = store
        .get_task(id)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Task))?;

    let owner = effective_task_owner(store, &task)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Project))?;

    require_ownership(user_id, owner)?;
    Ok(task)
}

/// Loads a report whose parent project the user owns
pub async fn authorize_report(store: &dyn Store, user_id: Id, id: Id) -> Result<Report, AuthzError> {
    let report = store
        .get_report(id)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Report))?;

    let owner = effective_report_owner(store, &report)
        .await?
        .ok_or(AuthzError::NotFound(EntityType::Project))?;

    require_ownership(user_id, owner)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::CreateClient;
    use crate::models::project::{CreateProject, ProjectStatus};
    use crate::models::task::{CreateTask, TaskPriority, TaskStatus};
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;
    use crate::store::ParentGuard;
    use chrono::Utc;

    struct Fixture {
        store: MemoryStore,
        alice: Id,
        bob: Id,
        client: Id,
        project: Id,
        task: Id,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let user = store
                .create_user(CreateUser {
                    username: name.to_string(),
                    password_hash: "hash".to_string(),
                    email: format!("{}@agency.test", name),
                    full_name: name.to_string(),
                    role: None,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let (alice, bob) = (ids[0], ids[1]);

        let client = store
            .create_client(CreateClient {
                name: "Acme".to_string(),
                contact_person: "Jane".to_string(),
                email: "jane@acme.test".to_string(),
                phone: None,
                website: None,
                notes: None,
                created_by: alice,
            })
            .await
            .unwrap();

        let project = store
            .create_project(
                CreateProject {
                    name: "Acme SEO".to_string(),
                    website: "https://acme.test".to_string(),
                    client_id: client.id,
                    start_date: Utc::now(),
                    end_date: None,
                    status: ProjectStatus::InProgress,
                    description: None,
                    attachments: None,
                    created_by: alice,
                },
                ParentGuard::client(client.id, alice),
            )
            .await
            .unwrap();

        // Created by bob's account id but inside alice's project
        let task = store
            .create_task(
                CreateTask {
                    title: "Audit".to_string(),
                    description: None,
                    project_id: project.id,
                    assigned_to: None,
                    due_date: None,
                    priority: TaskPriority::Medium,
                    status: TaskStatus::Pending,
                    created_by: bob,
                },
                ParentGuard::project(project.id, alice),
            )
            .await
            .unwrap();

        Fixture {
            store,
            alice,
            bob,
            client: client.id,
            project: project.id,
            task: task.id,
        }
    }

    #[tokio::test]
    async fn test_client_ownership() {
        let f = fixture().await;

        assert!(authorize_client(&f.store, f.alice, f.client).await.is_ok());
        assert!(matches!(
            authorize_client(&f.store, f.bob, f.client).await,
            Err(AuthzError::Forbidden)
        ));
        assert!(matches!(
            authorize_client(&f.store, f.bob, 999).await,
            Err(AuthzError::NotFound(EntityType::Client))
        ));
    }

    #[tokio::test]
    async fn test_task_authorized_through_parent_project() {
        let f = fixture().await;

        assert!(authorize_task(&f.store, f.alice, f.task).await.is_ok());
        assert!(matches!(
            authorize_task(&f.store, f.bob, f.task).await,
            Err(AuthzError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_orphaned_task_is_not_found() {
        let f = fixture().await;
        assert!(f.store.delete_project(f.project).await.unwrap());

        assert!(matches!(
            authorize_task(&f.store, f.alice, f.task).await,
            Err(AuthzError::NotFound(EntityType::Project))
        ));
    }

    #[tokio::test]
    async fn test_project_survives_client_deletion() {
        let f = fixture().await;
        assert!(f.store.delete_client(f.client).await.unwrap());

        let project = authorize_project(&f.store, f.alice, f.project).await.unwrap();
        assert_eq!(project.client_id, f.client);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            AuthzError::NotFound(EntityType::Client).to_string(),
            "Client not found"
        );
    }
}
