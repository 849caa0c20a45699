//! Settings table operations.
//!
//! Values are stored as text. Updates never insert: writing a key that was
//! not seeded is a silent no-op, reported through the returned flag/count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Setting;

/// Persistence for the key-value settings table.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// All settings ordered by category, then key.
    async fn list_all(&self) -> Result<Vec<Setting>, RepositoryError>;

    /// Update one existing key, stamping `updated_at`.
    ///
    /// Returns `false` when the key does not exist.
    async fn update_value(&self, key: &str, value: &str) -> Result<bool, RepositoryError>;

    /// Update several existing keys in one transaction.
    ///
    /// Either every statement commits or none does. Returns the number of
    /// rows changed; keys that do not exist are skipped.
    async fn update_many(&self, values: &[(String, String)]) -> Result<usize, RepositoryError>;

    /// Insert a row unless the key already exists. Returns whether a row was added.
    async fn insert_if_missing(
        &self,
        key: &str,
        value: &str,
        category: &str,
    ) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
    category: String,
    updated_at: DateTime<Utc>,
}

impl From<SettingRow> for Setting {
    fn from(row: SettingRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            category: row.category,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Postgres Repository
// =============================================================================

/// `PostgreSQL` settings repository.
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn list_all(&self) -> Result<Vec<Setting>, RepositoryError> {
        let rows = sqlx::query_as::<_, SettingRow>(
            r"
            SELECT key, value, category, updated_at
            FROM bistro.settings
            ORDER BY category, key
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_value(&self, key: &str, value: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE bistro.settings
            SET value = $1, updated_at = NOW()
            WHERE key = $2
            ",
        )
        .bind(value)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_many(&self, values: &[(String, String)]) -> Result<usize, RepositoryError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;
        let mut changed = 0_usize;

        for (key, value) in values {
            let result = sqlx::query(
                r"
                UPDATE bistro.settings
                SET value = $1, updated_at = NOW()
                WHERE key = $2
                ",
            )
            .bind(value)
            .bind(key)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                changed += 1;
            }
        }

        tx.commit().await?;
        Ok(changed)
    }

    async fn insert_if_missing(
        &self,
        key: &str,
        value: &str,
        category: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO bistro.settings (key, value, category)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(key)
        .bind(value)
        .bind(category)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
