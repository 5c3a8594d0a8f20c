/// Report endpoints
///
/// # Endpoints
///
/// - `GET /api/reports` - Reports whose project the caller owns
/// - `POST /api/reports` - Generate a report for an owned project
/// - `GET /api/reports/:id` - One report
///
/// When `content` is omitted or blank the server fills it from a template,
/// with `includeTaskStats`, `includeCharts` and `includeClientInfo` (all
/// default true) selecting the sections mentioned.

use std::collections::HashSet;

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
use seodesk_shared::{
    auth::{authorization::authorize_report, session::AuthContext},
    models::{
        activity_log::NewActivityLog,
        report::{CreateReport, Report, ReportSections},
        Id,
    },
    store::ParentGuard,
};
use serde::Deserialize;
use validator::Validate;

const INVALID: &str = "Invalid report data";

/// Create report request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(required(message = "Project is required"))]
    pub project_id: Option<Id>,

    pub content: Option<String>,

    pub include_task_stats: Option<bool>,

    pub include_charts: Option<bool>,

    pub include_client_info: Option<bool>,
}

impl CreateReportRequest {
    fn sections(&self) -> ReportSections {
        let defaults = ReportSections::default();
        ReportSections {
            task_stats: self.include_task_stats.unwrap_or(defaults.task_stats),
            charts: self.include_charts.unwrap_or(defaults.charts),
            client_info: self.include_client_info.unwrap_or(defaults.client_info),
        }
    }

    fn into_create(self, created_by: Id) -> ApiResult<CreateReport> {
        validate(&self, INVALID)?;

        let project_id = self
            .project_id
            .ok_or_else(|| ApiError::invalid_field(INVALID, "projectId", "Project is required"))?;

        let content = match self.content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.sections().render(project_id),
        };

        Ok(CreateReport {
            title: self.title,
            project_id,
            content,
            created_by,
        })
    }
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Report>>> {
    let owned: HashSet<Id> = state
        .store
        .list_projects_by_owner(auth.user_id())
        .await?
        .into_iter()
        .map(|project| project.id)
        .collect();

    let reports = state
        .store
        .list_reports()
        .await?
        .into_iter()
        .filter(|report| owned.contains(&report.project_id))
        .collect();

    Ok(Json(reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Report>> {
    let report = authorize_report(state.store.as_ref(), auth.user_id(), id).await?;
    Ok(Json(report))
}

/// Generate a report
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: `projectId` is missing or owned by someone else
pub async fn create_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let data = req.into_create(auth.user_id())?;
    let guard = ParentGuard::project(data.project_id, auth.user_id());

    let report = state.store.create_report(data, guard).await?;

    state
        .activity
        .record(NewActivityLog::report_generated(
            auth.user_id(),
            report.id,
            &report.title,
        ))
        .await;

    Ok((StatusCode::CREATED, Json(report)))
}
