/// Dashboard endpoint
///
/// ```text
/// GET /api/dashboard/stats
/// ```
///
/// Returns `{stats, taskProgress, projectStats, recentActivities,
/// recentClients, upcomingDeadlines}` for the caller. A caller without
/// projects gets zeros and empty lists.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use seodesk_shared::{auth::session::AuthContext, dashboard::DashboardSnapshot};

pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardSnapshot>> {
    let snapshot = state.dashboard.snapshot(auth.user_id(), Utc::now()).await?;
    Ok(Json(snapshot))
}
