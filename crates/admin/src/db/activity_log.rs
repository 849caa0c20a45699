//! Activity log table operations (append-only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bistro_core::{ActivityLogId, AdminUserId};

use super::RepositoryError;
use crate::models::{ActivityEntry, NewActivity};

/// Persistence for the audit trail. Entries are never updated or deleted.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogId, RepositoryError>;

    /// Most recent entries first, joined with the actor's names.
    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i32,
    user_id: Option<i32>,
    username: Option<String>,
    full_name: Option<String>,
    action: String,
    description: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: ActivityLogId::new(row.id),
            user_id: row.user_id.map(AdminUserId::new),
            username: row.username,
            full_name: row.full_name,
            action: row.action,
            description: row.description,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

/// `PostgreSQL` activity log repository.
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO bistro.activity_log (user_id, action, description, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(entry.user_id.map(|id| id.as_i32()))
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(entry.ip_address.as_deref())
        .bind(entry.user_agent.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "activity entry"))?;

        Ok(ActivityLogId::new(id))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT a.id, a.user_id, u.username, u.full_name, a.action, a.description,
                   a.ip_address, a.user_agent, a.created_at
            FROM bistro.activity_log a
            LEFT JOIN bistro.admin_user u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
