/// Activity logger
///
/// Appends one audit entry per mutating action after the action has been
/// committed. Logging is best-effort: a failed append is reported through
/// `tracing` and never reaches the caller or undoes the action.

use std::sync::Arc;

use crate::models::activity_log::{ActivityAction, EntityType, NewActivityLog};
use crate::models::Id;
use crate::store::Store;

/// Write-through audit trail over the shared store
#[derive(Clone)]
pub struct ActivityLogger {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLogger")
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends `entry`, swallowing any failure
    pub async fn record(&self, entry: NewActivityLog) {
        let action = entry.action;
        let entity_type = entry.entity_type;
        let entity_id = entry.entity_id;

        if let Err(e) = self.store.append_activity(entry).await {
            tracing::warn!(
                action = ?action,
                entity_type = ?entity_type,
                entity_id = entity_id,
                error = %e,
                "Failed to create activity log entry"
            );
        }
    }

    /// Records a create/update/delete of a named entity
    pub async fn mutation(
        &self,
        user_id: Id,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: Id,
        name: &str,
    ) {
        self.record(NewActivityLog::mutation(
            user_id,
            action,
            entity_type,
            entity_id,
            name,
        ))
        .await;
    }

    /// Records an account-level event (register, login, logout, profile update)
    pub async fn account(&self, user_id: Id, action: ActivityAction) {
        self.record(NewActivityLog::account(user_id, action)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let user = store
            .create_user(CreateUser {
                username: "jdoe".to_string(),
                password_hash: "hash".to_string(),
                email: "jdoe@agency.test".to_string(),
                full_name: "John Doe".to_string(),
                role: None,
            })
            .await
            .unwrap();
        let logger = ActivityLogger::new(store.clone());

        logger
            .mutation(user.id, ActivityAction::Created, EntityType::Client, 3, "Acme")
            .await;

        let logs = store.recent_activity_for_user(user.id, 5).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].details.as_deref(), Some("Created client: Acme"));
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let logger = ActivityLogger::new(store.clone());

        // No such user: the append fails, the call still returns normally
        logger.account(42, ActivityAction::LoggedIn).await;

        assert!(store.recent_activity(10).await.unwrap().is_empty());
    }
}
