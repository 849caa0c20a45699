//! Dashboard aggregate queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::RepositoryError;
use super::reservations::parse_status_counts;
use crate::models::DashboardStats;

/// Read-only aggregates for the landing page.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, RepositoryError>;
}

/// `PostgreSQL` dashboard repository.
pub struct PgDashboardRepository {
    pool: PgPool,
}

impl PgDashboardRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let (total_reservations, pending_reservations, active_menu_items, approved_testimonials): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM bistro.reservation),
                (SELECT COUNT(*) FROM bistro.reservation WHERE status = 'pending'),
                (SELECT COUNT(*) FROM bistro.menu_item WHERE is_active),
                (SELECT COUNT(*) FROM bistro.testimonial WHERE is_approved)
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_status: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM bistro.reservation GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let items_by_category: Vec<(String, i64)> = sqlx::query_as(
            r"
            SELECT c.name, COUNT(i.id)
            FROM bistro.menu_category c
            LEFT JOIN bistro.menu_item i ON i.category_id = c.id AND i.is_active
            GROUP BY c.id, c.name, c.display_order
            ORDER BY c.display_order, c.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_reservations,
            pending_reservations,
            active_menu_items,
            approved_testimonials,
            reservations_by_status: parse_status_counts(by_status)?,
            items_by_category,
        })
    }
}
