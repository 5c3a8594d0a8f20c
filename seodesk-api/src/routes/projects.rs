/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - Caller's projects, newest first
/// - `POST /api/projects` - Create a project under an owned client
/// - `GET /api/projects/:id` - One project
/// - `PUT /api/projects/:id` - Partial update (re-checks a changed `clientId`)
/// - `DELETE /api/projects/:id` - Delete (tasks and reports are left in place)
/// - `GET /api/projects/:projectId/tasks` - Tasks of an owned project
/// - `GET /api/projects/:projectId/reports` - Reports of an owned project
///
/// A project stays reachable by its creator after its client is deleted.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use seodesk_shared::{
    auth::{authorization::authorize_project, session::AuthContext},
    models::{
        activity_log::{ActivityAction, EntityType},
        project::{CreateProject, Project, ProjectStatus, UpdateProject},
        report::Report,
        task::Task,
        Id,
    },
    store::ParentGuard,
};
use serde::Deserialize;
use validator::Validate;

const INVALID: &str = "Invalid project data";

/// Create project request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Website is required"))]
    pub website: String,

    #[validate(required(message = "Client is required"))]
    pub client_id: Option<Id>,

    #[validate(required(message = "Start date is required"))]
    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,

    pub status: Option<ProjectStatus>,

    pub description: Option<String>,

    pub attachments: Option<Vec<String>>,
}

impl CreateProjectRequest {
    /// Validates and converts, with the owner taken from the session
    fn into_create(self, created_by: Id) -> ApiResult<CreateProject> {
        validate(&self, INVALID)?;

        let client_id = self
            .client_id
            .ok_or_else(|| ApiError::invalid_field(INVALID, "clientId", "Client is required"))?;
        let start_date = self
            .start_date
            .ok_or_else(|| ApiError::invalid_field(INVALID, "startDate", "Start date is required"))?;

        Ok(CreateProject {
            name: self.name,
            website: self.website,
            client_id,
            start_date,
            end_date: self.end_date,
            status: self.status.unwrap_or_default(),
            description: self.description,
            attachments: self.attachments,
            created_by,
        })
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.store.list_projects_by_owner(auth.user_id()).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Project>> {
    let project = authorize_project(state.store.as_ref(), auth.user_id(), id).await?;
    Ok(Json(project))
}

/// Create a project
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: `clientId` is missing or owned by someone else
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let data = req.into_create(auth.user_id())?;
    let guard = ParentGuard::client(data.client_id, auth.user_id());

    let project = state.store.create_project(data, guard).await?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Created,
            EntityType::Project,
            project.id,
            &project.name,
        )
        .await;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
    body: Result<ApiJson<UpdateProject>, ApiError>,
) -> ApiResult<Json<Project>> {
    let existing = authorize_project(state.store.as_ref(), auth.user_id(), id).await?;

    let ApiJson(changes) = body?;
    validate(&changes, INVALID)?;

    let guard = changes
        .client_id
        .map(|client_id| ParentGuard::client(client_id, auth.user_id()));

    let project = state
        .store
        .update_project(id, changes, guard)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Updated,
            EntityType::Project,
            id,
            &existing.name,
        )
        .await;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<StatusCode> {
    let existing = authorize_project(state.store.as_ref(), auth.user_id(), id).await?;

    if !state.store.delete_project(id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Deleted,
            EntityType::Project,
            id,
            &existing.name,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Id>,
) -> ApiResult<Json<Vec<Task>>> {
    authorize_project(state.store.as_ref(), auth.user_id(), project_id).await?;

    let tasks = state.store.list_tasks_by_project(project_id).await?;
    Ok(Json(tasks))
}

pub async fn list_project_reports(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Id>,
) -> ApiResult<Json<Vec<Report>>> {
    authorize_project(state.store.as_ref(), auth.user_id(), project_id).await?;

    let reports = state.store.list_reports_by_project(project_id).await?;
    Ok(Json(reports))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_create_defaults_status() {
        let req: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Acme SEO",
            "website": "https://acme.test",
            "clientId": 3,
            "startDate": "2025-01-01T00:00:00Z"
        }))
        .unwrap();

        let data = req.into_create(7).unwrap();
        assert_eq!(data.client_id, 3);
        assert_eq!(data.created_by, 7);
        assert_eq!(data.status, ProjectStatus::InProgress);
    }

    #[test]
    fn test_into_create_reports_missing_fields() {
        let req: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Acme SEO"
        }))
        .unwrap();

        match req.into_create(7) {
            Err(ApiError::ValidationError { message, errors }) => {
                assert_eq!(message, INVALID);
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["clientId", "startDate", "website"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
