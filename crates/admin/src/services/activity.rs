//! Activity logging with failure containment.
//!
//! Recording is a side effect that runs after the primary operation has
//! finished. A failed write is reported to the operational log and then
//! dropped; it never reaches the caller.

use std::sync::Arc;

use bistro_core::AdminUserId;

use crate::db::ActivityLogRepository;
use crate::models::NewActivity;
use crate::models::activity::ClientInfo;

/// Appends entries to the audit trail.
#[derive(Clone)]
pub struct ActivityLogger {
    repo: Arc<dyn ActivityLogRepository>,
}

impl ActivityLogger {
    #[must_use]
    pub fn new(repo: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repo }
    }

    /// Append one entry. Never fails and never retries.
    pub async fn record(
        &self,
        actor: Option<AdminUserId>,
        client: &ClientInfo,
        action: &str,
        description: impl Into<String>,
    ) {
        let entry = NewActivity {
            user_id: actor,
            action: action.to_string(),
            description: description.into(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        };

        if let Err(e) = self.repo.append(&entry).await {
            tracing::warn!(
                action = %entry.action,
                user_id = ?entry.user_id.map(|id| id.as_i32()),
                error = %e,
                "Failed to record activity"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryDatabase;

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("test-agent".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_appends_entry() {
        let db = MemoryDatabase::new();
        let logger = ActivityLogger::new(db.repositories().activity);

        logger
            .record(None, &client(), "update_settings", "Updated website settings")
            .await;

        let entries = db.activity_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "update_settings");
        assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(entries[0].user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn test_record_swallows_sink_failure() {
        let db = MemoryDatabase::new();
        db.set_activity_unavailable(true);
        let logger = ActivityLogger::new(db.repositories().activity);

        // Completes without panicking or returning an error.
        logger
            .record(Some(AdminUserId::new(1)), &client(), "login", "Logged in")
            .await;

        assert!(db.activity_entries().await.is_empty());
    }
}
