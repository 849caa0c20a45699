//! Admin user repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bistro_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::admin_user::{AdminRole, AdminUser, NewAdminUser};

/// Persistence for staff accounts.
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// Look up an account by login name.
    async fn get_by_username(&self, username: &str) -> Result<Option<AdminUser>, RepositoryError>;

    /// Stamp `last_login` with the current time.
    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError>;

    /// Create an account.
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    async fn create(&self, user: &NewAdminUser) -> Result<AdminUser, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    username: String,
    email: String,
    full_name: String,
    role: String,
    password_hash: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<AdminRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            username: row.username,
            email,
            full_name: row.full_name,
            role,
            password_hash: row.password_hash,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` admin user repository.
pub struct PgAdminUserRepository {
    pool: PgPool,
}

impl PgAdminUserRepository {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserRepository for PgAdminUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username, email, full_name, role, password_hash,
                   is_active, last_login, created_at
            FROM bistro.admin_user
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE bistro.admin_user SET last_login = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create(&self, user: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO bistro.admin_user (username, email, full_name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, full_name, role, password_hash,
                      is_active, last_login, created_at
            ",
        )
        .bind(&user.username)
        .bind(user.email.as_str())
        .bind(&user.full_name)
        .bind(user.role.to_string())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username or email"))?;

        row.try_into()
    }
}
