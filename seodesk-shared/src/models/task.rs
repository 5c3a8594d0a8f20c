/// Task model and database operations
///
/// Tasks are work items inside a project. Access to a task is decided by the
/// owner of its parent project, never by the task's own `created_by`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id SERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT,
///     project_id INTEGER NOT NULL,
///     assigned_to INTEGER REFERENCES users(id),
///     due_date TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'pending',
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use seodesk_shared::models::task::{Task, TaskStatus};
/// use seodesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let now = Utc::now();
/// let due_this_week = Task::list_due_between(&pool, now, now + Duration::days(7)).await?;
/// let blocked = Task::list_by_status(&pool, TaskStatus::InProgress).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use validator::Validate;

use super::{double_option, Id, Record};

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,

    /// Someone is working on it
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Id,

    /// Short summary
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Parent project
    pub project_id: Id,

    /// User the task is assigned to
    pub assigned_to: Option<Id>,

    /// Deadline
    pub due_date: Option<DateTime<Utc>>,

    pub priority: TaskPriority,

    pub status: TaskStatus,

    /// User who created the task
    pub created_by: Id,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Pending with a deadline strictly before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.due_date.is_some_and(|due| due < now)
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Id,
    pub assigned_to: Option<Id>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_by: Id,
}

/// Partial update of a task
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// Moving a task to another project re-runs the project ownership check
    pub project_id: Option<Id>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Id>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    /// Merges the changes into an existing task
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

impl Record for Task {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Task {
    /// Inserts a new task
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if `assigned_to` or `created_by` does
    /// not name an existing user.
    pub async fn create<'e, E>(executor: E, data: &CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, project_id, assigned_to, due_date,
                               priority, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, project_id, assigned_to, due_date,
                      priority, status, created_by, created_at
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID and locks the row until the transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists all tasks, newest first
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks created by a user, newest first
    pub async fn list_by_owner<'e, E>(executor: E, owner: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE created_by = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists the tasks of a project, newest first
    pub async fn list_by_project<'e, E>(executor: E, project_id: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks in the given status, newest first
    pub async fn list_by_status<'e, E>(
        executor: E,
        status: TaskStatus,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE status = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists pending tasks due within `[start, end]`, earliest deadline first
    pub async fn list_due_between<'e, E>(
        executor: E,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, project_id, assigned_to, due_date,
                   priority, status, created_by, created_at
            FROM tasks
            WHERE status = 'pending' AND due_date >= $1 AND due_date <= $2
            ORDER BY due_date ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Writes every mutable column of `task` back to its row
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let saved = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, project_id = $4, assigned_to = $5,
                due_date = $6, priority = $7, status = $8
            WHERE id = $1
            RETURNING id, title, description, project_id, assigned_to, due_date,
                      priority, status, created_by, created_at
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.project_id)
        .bind(task.assigned_to)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.status)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }

    /// Deletes a task by ID
    pub async fn delete<'e, E>(executor: E, id: Id) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks created by a user in the given status
    pub async fn count_by_status<'e, E>(
        executor: E,
        owner: Id,
        status: TaskStatus,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks WHERE created_by = $1 AND status = $2",
        )
        .bind(owner)
        .bind(status)
        .fetch_one(executor)
        .await
    }

    /// Counts a user's pending tasks whose deadline has passed
    pub async fn count_overdue<'e, E>(
        executor: E,
        owner: Id,
        now: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE created_by = $1 AND status = 'pending' AND due_date < $2
            "#,
        )
        .bind(owner)
        .bind(now)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_task() -> Task {
        Task {
            id: 11,
            title: "Fix meta descriptions".to_string(),
            description: None,
            project_id: 4,
            assigned_to: None,
            due_date: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            created_by: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults() {
        let task = sample_task();
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let mut task = sample_task();
        assert!(!task.is_overdue(now));

        task.due_date = Some(now - Duration::hours(1));
        assert!(task.is_overdue(now));

        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(now));

        task.status = TaskStatus::Pending;
        task.due_date = Some(now);
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_task_wire_format() {
        let mut task = sample_task();
        task.status = TaskStatus::InProgress;

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["projectId"], 4);
        assert!(json["dueDate"].is_null());
    }

    #[test]
    fn test_update_unassigns_task() {
        let mut task = sample_task();
        task.assigned_to = Some(2);

        let update: UpdateTask =
            serde_json::from_str(r#"{"assignedTo": null, "priority": "high"}"#).unwrap();
        update.apply(&mut task);

        assert_eq!(task.assigned_to, None);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.project_id, 4);
    }
}
