//! Admin user domain types.

use chrono::{DateTime, Utc};

use bistro_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use bistro_core::AdminRole;

/// A staff account (domain type).
///
/// Implements `Debug` manually so the password hash never reaches logs.
#[derive(Clone)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Permission level.
    pub role: AdminRole,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("last_login", &self.last_login)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Input for creating a staff account.
#[derive(Clone)]
pub struct NewAdminUser {
    pub username: String,
    pub email: Email,
    pub full_name: String,
    pub role: AdminRole,
    pub password_hash: String,
}
