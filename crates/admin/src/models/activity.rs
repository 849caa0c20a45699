//! Activity log entries.

use chrono::{DateTime, Utc};

use bistro_core::{ActivityLogId, AdminUserId};

/// An entry to append to the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    /// Acting admin; `None` for anonymous actions such as failed logins.
    pub user_id: Option<AdminUserId>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A stored activity entry joined with the acting admin's names.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: ActivityLogId,
    pub user_id: Option<AdminUserId>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Name to show for the actor.
    #[must_use]
    pub fn actor(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("System")
    }
}

/// Originating address and client identification of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
