/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - Tasks created by the caller
/// - `POST /api/tasks` - Create a task inside an owned project
/// - `GET /api/tasks/upcoming?days=N` - Pending tasks due in the next N days (default 7)
/// - `GET /api/tasks/:id` - One task
/// - `PUT /api/tasks/:id` - Partial update (re-checks a changed `projectId`)
/// - `DELETE /api/tasks/:id` - Delete
///
/// Access to a single task is decided by the owner of its parent project, not
/// by the task's own `createdBy`.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use seodesk_shared::{
    auth::{authorization::authorize_task, session::AuthContext},
    dashboard::{upcoming_for_user, DEFAULT_UPCOMING_DAYS},
    models::{
        activity_log::{ActivityAction, EntityType},
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        Id,
    },
    store::ParentGuard,
};
use serde::Deserialize;
use validator::Validate;

const INVALID: &str = "Invalid task data";

/// Largest accepted `days` for the upcoming-tasks window
pub const MAX_UPCOMING_DAYS: i64 = 365;

/// Create task request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(required(message = "Project is required"))]
    pub project_id: Option<Id>,

    pub assigned_to: Option<Id>,

    pub due_date: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,
}

impl CreateTaskRequest {
    fn into_create(self, created_by: Id) -> ApiResult<CreateTask> {
        validate(&self, INVALID)?;

        let project_id = self
            .project_id
            .ok_or_else(|| ApiError::invalid_field(INVALID, "projectId", "Project is required"))?;

        Ok(CreateTask {
            title: self.title,
            description: self.description,
            project_id,
            assigned_to: self.assigned_to,
            due_date: self.due_date,
            priority: self.priority.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            created_by,
        })
    }
}

/// Query for `GET /api/tasks/upcoming`
#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<String>,
}

impl UpcomingQuery {
    fn days(&self) -> ApiResult<i64> {
        let Some(raw) = self.days.as_deref() else {
            return Ok(DEFAULT_UPCOMING_DAYS);
        };

        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|days| (0..=MAX_UPCOMING_DAYS).contains(days))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "days must be a whole number between 0 and {}",
                    MAX_UPCOMING_DAYS
                ))
            })
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.store.list_tasks_by_owner(auth.user_id()).await?;
    Ok(Json(tasks))
}

/// Pending tasks due soon in the caller's projects, soonest first
pub async fn upcoming_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let days = query.days()?;

    let tasks = upcoming_for_user(state.store.as_ref(), auth.user_id(), Utc::now(), days).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Task>> {
    let task = authorize_task(state.store.as_ref(), auth.user_id(), id).await?;
    Ok(Json(task))
}

/// Create a task
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or `assignedTo` is not a user
/// - `403 Forbidden`: `projectId` is missing or owned by someone else
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let data = req.into_create(auth.user_id())?;
    let guard = ParentGuard::project(data.project_id, auth.user_id());

    let task = state.store.create_task(data, guard).await?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Created,
            EntityType::Task,
            task.id,
            &task.title,
        )
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
    body: Result<ApiJson<UpdateTask>, ApiError>,
) -> ApiResult<Json<Task>> {
    let existing = authorize_task(state.store.as_ref(), auth.user_id(), id).await?;

    let ApiJson(changes) = body?;
    validate(&changes, INVALID)?;

    let guard = changes
        .project_id
        .map(|project_id| ParentGuard::project(project_id, auth.user_id()));

    let task = state
        .store
        .update_task(id, changes, guard)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Updated,
            EntityType::Task,
            id,
            &existing.title,
        )
        .await;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<StatusCode> {
    let existing = authorize_task(state.store.as_ref(), auth.user_id(), id).await?;

    if !state.store.delete_task(id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Deleted,
            EntityType::Task,
            id,
            &existing.title,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(days: Option<&str>) -> UpcomingQuery {
        UpcomingQuery {
            days: days.map(String::from),
        }
    }

    #[test]
    fn test_upcoming_days() {
        assert_eq!(query(None).days().unwrap(), DEFAULT_UPCOMING_DAYS);
        assert_eq!(query(Some("14")).days().unwrap(), 14);
        assert_eq!(query(Some("0")).days().unwrap(), 0);
        assert!(query(Some("-1")).days().is_err());
        assert!(query(Some("soon")).days().is_err());
        assert!(query(Some("100000")).days().is_err());
    }

    #[test]
    fn test_into_create_defaults() {
        let req: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Audit backlinks",
            "projectId": 5
        }))
        .unwrap();

        let data = req.into_create(2).unwrap();
        assert_eq!(data.project_id, 5);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert_eq!(data.status, TaskStatus::Pending);
        assert_eq!(data.created_by, 2);
    }
}
