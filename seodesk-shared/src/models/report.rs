/// Report model and database operations
///
/// Reports are generated documents attached to a project. Like tasks, their
/// access is gated by the owner of the parent project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE reports (
///     id SERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     project_id INTEGER NOT NULL,
///     content TEXT NOT NULL,
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use validator::Validate;

use super::{Id, Record};

/// Report model
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Id,
    pub title: String,
    pub project_id: Id,
    pub content: String,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new report
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub title: String,
    pub project_id: Id,
    pub content: String,
    pub created_by: Id,
}

/// Partial update of a report
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    pub project_id: Option<Id>,

    pub content: Option<String>,
}

impl UpdateReport {
    /// Merges the changes into an existing report
    pub fn apply(&self, report: &mut Report) {
        if let Some(title) = &self.title {
            report.title = title.clone();
        }
        if let Some(project_id) = self.project_id {
            report.project_id = project_id;
        }
        if let Some(content) = &self.content {
            report.content = content.clone();
        }
    }
}

/// Sections requested when the server generates report content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSections {
    pub task_stats: bool,
    pub charts: bool,
    pub client_info: bool,
}

impl Default for ReportSections {
    fn default() -> Self {
        Self {
            task_stats: true,
            charts: true,
            client_info: true,
        }
    }
}

impl ReportSections {
    /// Renders the templated body for a report on `project_id`
    pub fn render(&self, project_id: Id) -> String {
        let mut content = format!("Generated report for project {}. ", project_id);
        if self.task_stats {
            content.push_str("Includes task statistics. ");
        }
        if self.charts {
            content.push_str("Includes performance charts. ");
        }
        if self.client_info {
            content.push_str("Includes client information. ");
        }
        content
    }
}

impl Record for Report {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Report {
    pub async fn create<'e, E>(executor: E, data: &CreateReport) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (title, project_id, content, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, project_id, content, created_by, created_at
            "#,
        )
        .bind(&data.title)
        .bind(data.project_id)
        .bind(&data.content)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(report)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, title, project_id, content, created_by, created_at
            FROM reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(report)
    }

    pub async fn find_for_update<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, title, project_id, content, created_by, created_at
            FROM reports
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(report)
    }

    /// Lists all reports, newest first
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, title, project_id, content, created_by, created_at
            FROM reports
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(reports)
    }

    /// Lists the reports of a project, newest first
    pub async fn list_by_project<'e, E>(executor: E, project_id: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, title, project_id, content, created_by, created_at
            FROM reports
            WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(reports)
    }

    pub async fn save<'e, E>(executor: E, report: &Report) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let saved = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET title = $2, project_id = $3, content = $4
            WHERE id = $1
            RETURNING id, title, project_id, content, created_by, created_at
            "#,
        )
        .bind(report.id)
        .bind(&report.title)
        .bind(report.project_id)
        .bind(&report.content)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }

    pub async fn delete<'e, E>(executor: E, id: Id) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
