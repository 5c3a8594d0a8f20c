/// Dashboard aggregation
///
/// Builds the per-user dashboard snapshot: headline counters, task progress
/// percentages, project totals, and the recent/upcoming feeds.
///
/// Counters are scoped by `created_by`. The upcoming-deadline feed is scoped
/// by parent project ownership instead, matching task access rules.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Utc;
/// use seodesk_shared::dashboard::DashboardAggregator;
/// use seodesk_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dashboard = DashboardAggregator::new(Arc::new(MemoryStore::new()));
/// let snapshot = dashboard.snapshot(1, Utc::now()).await?;
/// println!("{} active projects", snapshot.stats.active_projects);
/// # Ok(())
/// # }
/// ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::activity_log::ActivityLog;
use crate::models::client::Client;
use crate::models::project::ProjectStatus;
use crate::models::task::{Task, TaskStatus};
use crate::models::Id;
use crate::store::{Store, StoreError};

/// Entries in the recent activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Entries in the recent clients list
pub const RECENT_CLIENTS_LIMIT: usize = 4;

/// Entries in the upcoming deadlines list
pub const UPCOMING_DEADLINES_LIMIT: usize = 5;

/// Look-ahead window for upcoming deadlines, in days
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Headline counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_projects: u64,
    pub completed_projects: u64,
    pub pending_tasks: u64,
    pub active_clients: u64,
}

/// Task progress breakdown
///
/// `total` is completed + in progress + pending. Each percentage is rounded
/// half-up on its own, so they need not sum to exactly 100. Overdue tasks are
/// a subset of pending ones and use the same total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
    pub overdue: u64,
    pub total: u64,
    pub completed_percentage: u64,
    pub in_progress_percentage: u64,
    pub pending_percentage: u64,
    pub overdue_percentage: u64,
}

impl TaskProgress {
    pub fn new(completed: u64, in_progress: u64, pending: u64, overdue: u64) -> Self {
        let total = completed + in_progress + pending;

        Self {
            completed,
            in_progress,
            pending,
            overdue,
            total,
            completed_percentage: percentage(completed, total),
            in_progress_percentage: percentage(in_progress, total),
            pending_percentage: percentage(pending, total),
            overdue_percentage: percentage(overdue, total),
        }
    }
}

/// Active and completed project totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub active_projects: u64,
    pub completed_projects: u64,
    pub total: u64,
}

/// Everything the dashboard page shows for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub task_progress: TaskProgress,
    pub project_stats: ProjectStats,
    pub recent_activities: Vec<ActivityLog>,
    pub recent_clients: Vec<Client>,
    pub upcoming_deadlines: Vec<Task>,
}

/// `round(100 * count / total)` with halves rounded up; 0 when `total` is 0
pub fn percentage(count: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (200 * count + total) / (2 * total)
}

/// Pending tasks due in `[now, now + days]` whose parent project `user_id` owns
///
/// Sorted by due date ascending with undated tasks last.
pub async fn upcoming_for_user(
    store: &dyn Store,
    user_id: Id,
    now: DateTime<Utc>,
    days: i64,
) -> Result<Vec<Task>, StoreError> {
    let owned: HashSet<Id> = store
        .list_projects_by_owner(user_id)
        .await?
        .into_iter()
        .map(|project| project.id)
        .collect();

    let mut tasks: Vec<Task> = store
        .list_tasks_due_between(now, now + Duration::days(days))
        .await?
        .into_iter()
        .filter(|task| owned.contains(&task.project_id))
        .collect();

    tasks.sort_by_key(|task| (task.due_date.is_none(), task.due_date));
    Ok(tasks)
}

/// Computes dashboard snapshots from the shared store
#[derive(Clone)]
pub struct DashboardAggregator {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for DashboardAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardAggregator")
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl DashboardAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Snapshot for `user_id` as of `now`
    ///
    /// A user without projects gets an all-zero snapshot and no further
    /// queries are made.
    pub async fn snapshot(
        &self,
        user_id: Id,
        now: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, StoreError> {
        let store = self.store.as_ref();

        if store.list_projects_by_owner(user_id).await?.is_empty() {
            return Ok(DashboardSnapshot::default());
        }

        let active_projects = store
            .count_projects_by_status(user_id, ProjectStatus::InProgress)
            .await?;
        let completed_projects = store
            .count_projects_by_status(user_id, ProjectStatus::Completed)
            .await?;

        let completed = store
            .count_tasks_by_status(user_id, TaskStatus::Completed)
            .await?;
        let in_progress = store
            .count_tasks_by_status(user_id, TaskStatus::InProgress)
            .await?;
        let pending = store
            .count_tasks_by_status(user_id, TaskStatus::Pending)
            .await?;
        let overdue = store.count_overdue_tasks(user_id, now).await?;

        let stats = DashboardStats {
            active_projects,
            completed_projects,
            pending_tasks: pending,
            active_clients: store.count_active_clients(user_id).await?,
        };

        let recent_activities = store
            .recent_activity_for_user(user_id, RECENT_ACTIVITY_LIMIT)
            .await?;

        let mut recent_clients = store.list_clients_by_owner(user_id).await?;
        recent_clients.truncate(RECENT_CLIENTS_LIMIT);

        let mut upcoming_deadlines =
            upcoming_for_user(store, user_id, now, DEFAULT_UPCOMING_DAYS).await?;
        upcoming_deadlines.truncate(UPCOMING_DEADLINES_LIMIT);

        Ok(DashboardSnapshot {
            stats,
            task_progress: TaskProgress::new(completed, in_progress, pending, overdue),
            project_stats: ProjectStats {
                active_projects,
                completed_projects,
                total: active_projects + completed_projects,
            },
            recent_activities,
            recent_clients,
            upcoming_deadlines,
        })
    }
}
