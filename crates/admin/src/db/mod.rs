//! Database operations for the admin panel.
//!
//! # Schema: `bistro`
//!
//! ## Tables
//!
//! - `admin_user` - Staff accounts (argon2 password hashes, role)
//! - `session` - tower-sessions storage
//! - `settings` - Key-value site settings (text values, JSON for structured ones)
//! - `activity_log` - Append-only audit trail
//! - `reservation` - Table reservations
//! - `menu_category`, `menu_item` - Menu content
//! - `testimonial` - Guest reviews (counted on the dashboard)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p bistro-cli -- migrate
//! ```
//!
//! Each table sits behind an `async_trait` repository trait. Handlers only
//! see the traits through [`Repositories`], so tests can swap the Postgres
//! implementations for the in-memory ones.

pub mod activity_log;
pub mod admin_users;
pub mod dashboard;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod menu;
pub mod reservations;
pub mod settings;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use activity_log::{ActivityLogRepository, PgActivityLogRepository};
pub use admin_users::{AdminUserRepository, PgAdminUserRepository};
pub use dashboard::{DashboardRepository, PgDashboardRepository};
pub use menu::{MenuRepository, PgMenuRepository};
pub use reservations::{PgReservationRepository, ReservationRepository};
pub use settings::{PgSettingsRepository, SettingsRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict`.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(format!("{what} references a missing row"));
            }
        }
        Self::Database(err)
    }
}

/// All repositories used by the panel.
#[derive(Clone)]
pub struct Repositories {
    pub settings: Arc<dyn SettingsRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
    pub admin_users: Arc<dyn AdminUserRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub menu: Arc<dyn MenuRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            settings: Arc::new(PgSettingsRepository::new(pool.clone())),
            activity: Arc::new(PgActivityLogRepository::new(pool.clone())),
            admin_users: Arc::new(PgAdminUserRepository::new(pool.clone())),
            reservations: Arc::new(PgReservationRepository::new(pool.clone())),
            menu: Arc::new(PgMenuRepository::new(pool.clone())),
            dashboard: Arc::new(PgDashboardRepository::new(pool.clone())),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
