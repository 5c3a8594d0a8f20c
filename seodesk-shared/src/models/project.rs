/// Project model and database operations
///
/// A project is an SEO engagement for one client. `client_id` must point at a
/// client owned by the same user as the project at write time, which the
/// store enforces with an ownership guard. There is no foreign key on
/// `client_id`: deleting a client leaves its projects in place.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('in_progress', 'completed', 'paused');
///
/// CREATE TABLE projects (
///     id SERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     website TEXT NOT NULL,
///     client_id INTEGER NOT NULL,
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ,
///     status project_status NOT NULL DEFAULT 'in_progress',
///     description TEXT,
///     attachments TEXT[],
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use validator::Validate;

use super::{double_option, Id, Record};

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work is ongoing
    #[default]
    InProgress,

    /// Engagement finished
    Completed,

    /// On hold
    Paused,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Paused => "paused",
        }
    }
}

/// Project model
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: Id,

    /// Project name
    pub name: String,

    /// Website being optimized
    pub website: String,

    /// Client this project is for
    pub client_id: Id,

    /// When work started
    pub start_date: DateTime<Utc>,

    /// Planned or actual end
    pub end_date: Option<DateTime<Utc>>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Free-form description
    pub description: Option<String>,

    /// Attachment references (URLs or file names)
    pub attachments: Option<Vec<String>>,

    /// Owning user
    pub created_by: Id,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub website: String,
    pub client_id: Id,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub description: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub created_by: Id,
}

/// Partial update of a project
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Website is required"))]
    pub website: Option<String>,

    /// Moving a project to another client re-runs the client ownership check
    pub client_id: Option<Id>,

    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,

    pub status: Option<ProjectStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub attachments: Option<Option<Vec<String>>>,
}

impl UpdateProject {
    /// Merges the changes into an existing project
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(website) = &self.website {
            project.website = website.clone();
        }
        if let Some(client_id) = self.client_id {
            project.client_id = client_id;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(attachments) = &self.attachments {
            project.attachments = attachments.clone();
        }
    }
}

impl Record for Project {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Project {
    /// Inserts a new project
    ///
    /// Callers are expected to have verified client ownership in the same
    /// transaction.
    pub async fn create<'e, E>(executor: E, data: &CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, website, client_id, start_date, end_date, status,
                                  description, attachments, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, website, client_id, start_date, end_date, status,
                      description, attachments, created_by, created_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.website)
        .bind(data.client_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.status)
        .bind(&data.description)
        .bind(&data.attachments)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, website, client_id, start_date, end_date, status,
                   description, attachments, created_by, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID and locks the row until the transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, website, client_id, start_date, end_date, status,
                   description, attachments, created_by, created_at
            FROM projects
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Returns the owner of a project, taking a share lock on its row
    pub async fn lock_owner<'e, E>(executor: E, id: Id) -> Result<Option<Id>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Id>("SELECT created_by FROM projects WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists all projects, newest first
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, website, client_id, start_date, end_date, status,
                   description, attachments, created_by, created_at
            FROM projects
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Lists the projects owned by a user, newest first
    pub async fn list_by_owner<'e, E>(executor: E, owner: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, website, client_id, start_date, end_date, status,
                   description, attachments, created_by, created_at
            FROM projects
            WHERE created_by = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Lists the projects of a client, newest first
    pub async fn list_by_client<'e, E>(executor: E, client_id: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, website, client_id, start_date, end_date, status,
                   description, attachments, created_by, created_at
            FROM projects
            WHERE client_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Writes every mutable column of `project` back to its row
    pub async fn save<'e, E>(executor: E, project: &Project) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let saved = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2, website = $3, client_id = $4, start_date = $5, end_date = $6,
                status = $7, description = $8, attachments = $9
            WHERE id = $1
            RETURNING id, name, website, client_id, start_date, end_date, status,
                      description, attachments, created_by, created_at
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.website)
        .bind(project.client_id)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.status)
        .bind(&project.description)
        .bind(&project.attachments)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }

    /// Deletes a project by ID, leaving its tasks and reports in place
    pub async fn delete<'e, E>(executor: E, id: Id) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a user's projects in the given status
    pub async fn count_by_status<'e, E>(
        executor: E,
        owner: Id,
        status: ProjectStatus,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects WHERE created_by = $1 AND status = $2",
        )
        .bind(owner)
        .bind(status)
        .fetch_one(executor)
        .await
    }
}
