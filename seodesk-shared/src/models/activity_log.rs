/// Activity log model and database operations
///
/// Append-only audit trail. Rows are only ever inserted and read; there is no
/// update or delete path.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE activity_action AS ENUM (
///     'created', 'updated', 'deleted', 'logged_in', 'logged_out', 'registered'
/// );
/// CREATE TYPE entity_type AS ENUM ('user', 'client', 'project', 'task', 'report');
///
/// CREATE TABLE activity_logs (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     action activity_action NOT NULL,
///     entity_type entity_type NOT NULL,
///     entity_id INTEGER NOT NULL,
///     details TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::{Id, Record};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    LoggedIn,
    LoggedOut,
    Registered,
}

/// Kind of entity an activity refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Client,
    Project,
    Task,
    Report,
}

impl EntityType {
    /// Human-readable name, as used in error messages ("Client not found")
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::User => "User",
            EntityType::Client => "Client",
            EntityType::Project => "Project",
            EntityType::Task => "Task",
            EntityType::Report => "Report",
        }
    }

    /// Lowercase name, as used in activity details ("Created client: Acme")
    pub fn noun(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Client => "client",
            EntityType::Project => "project",
            EntityType::Task => "task",
            EntityType::Report => "report",
        }
    }
}

/// One audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Id,

    /// User who performed the action
    pub user_id: Id,

    pub action: ActivityAction,

    pub entity_type: EntityType,

    pub entity_id: Id,

    /// Short description shown in the dashboard feed
    pub details: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for appending an activity entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: Id,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Id,
    pub details: Option<String>,
}

impl NewActivityLog {
    /// Entry for a create/update/delete of a named entity
    ///
    /// Produces details such as `"Created client: Acme"`.
    pub fn mutation(
        user_id: Id,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: Id,
        name: &str,
    ) -> Self {
        let verb = match action {
            ActivityAction::Created => "Created",
            ActivityAction::Updated => "Updated",
            ActivityAction::Deleted => "Deleted",
            ActivityAction::LoggedIn => "Logged in",
            ActivityAction::LoggedOut => "Logged out",
            ActivityAction::Registered => "Registered",
        };

        Self {
            user_id,
            action,
            entity_type,
            entity_id,
            details: Some(format!("{} {}: {}", verb, entity_type.noun(), name)),
        }
    }

    /// Entry for a generated report (`"Generated report: {title}"`)
    pub fn report_generated(user_id: Id, report_id: Id, title: &str) -> Self {
        Self {
            user_id,
            action: ActivityAction::Created,
            entity_type: EntityType::Report,
            entity_id: report_id,
            details: Some(format!("Generated report: {}", title)),
        }
    }

    /// Entry for an account-level event on the user's own record
    pub fn account(user_id: Id, action: ActivityAction) -> Self {
        let details = match action {
            ActivityAction::Registered => "User registration",
            ActivityAction::LoggedIn => "User login",
            ActivityAction::LoggedOut => "User logout",
            ActivityAction::Updated => "Profile update",
            ActivityAction::Created => "User created",
            ActivityAction::Deleted => "User deleted",
        };

        Self {
            user_id,
            action,
            entity_type: EntityType::User,
            entity_id: user_id,
            details: Some(details.to_string()),
        }
    }
}

impl Record for ActivityLog {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl ActivityLog {
    /// Appends an entry
    pub async fn append<'e, E>(executor: E, entry: &NewActivityLog) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let log = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (user_id, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, action, entity_type, entity_id, details, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    /// Most recent entries across all users
    pub async fn recent<'e, E>(executor: E, limit: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let logs = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, details, created_at
            FROM activity_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }

    /// Most recent entries for one user
    pub async fn recent_for_user<'e, E>(
        executor: E,
        user_id: Id,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let logs = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, details, created_at
            FROM activity_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }
}
