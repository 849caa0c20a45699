//! Reservation table operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

use bistro_core::{ReservationId, ReservationStatus};

use super::RepositoryError;
use crate::models::{NewReservation, Reservation, ReservationStats};

/// Persistence for table reservations.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// All reservations, newest date and time first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// Reservations on one day, ordered by time.
    async fn for_date(&self, day: NaiveDate) -> Result<Vec<Reservation>, RepositoryError>;

    /// The most recently created reservations.
    async fn recent(&self, limit: i64) -> Result<Vec<Reservation>, RepositoryError>;

    /// Counts overall and per status.
    async fn stats(&self) -> Result<ReservationStats, RepositoryError>;

    /// Set status and table number, stamping `updated_at`.
    ///
    /// Returns the updated reservation, or `None` when no reservation has
    /// this id.
    async fn update_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        table_number: Option<&str>,
    ) -> Result<Option<Reservation>, RepositoryError>;

    /// Insert a reservation.
    async fn create(&self, reservation: &NewReservation) -> Result<Reservation, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: i32,
    confirmation_code: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    reservation_date: NaiveDate,
    reservation_time: NaiveTime,
    party_size: i32,
    special_requests: Option<String>,
    status: String,
    table_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = RepositoryError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ReservationStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: ReservationId::new(row.id),
            confirmation_code: row.confirmation_code,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            reservation_date: row.reservation_date,
            reservation_time: row.reservation_time,
            party_size: row.party_size,
            special_requests: row.special_requests,
            status,
            table_number: row.table_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RESERVATION_COLUMNS: &str = r"
    id, confirmation_code, customer_name, customer_email, customer_phone,
    reservation_date, reservation_time, party_size, special_requests,
    status, table_number, created_at, updated_at
";

/// Parse `(status, count)` rows, failing on unknown statuses.
pub(crate) fn parse_status_counts(
    rows: Vec<(String, i64)>,
) -> Result<Vec<(ReservationStatus, i64)>, RepositoryError> {
    rows.into_iter()
        .map(|(status, count)| {
            status
                .parse::<ReservationStatus>()
                .map(|status| (status, count))
                .map_err(RepositoryError::DataCorruption)
        })
        .collect()
}

// =============================================================================
// Postgres Repository
// =============================================================================

/// `PostgreSQL` reservation repository.
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn list(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM bistro.reservation
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY reservation_date DESC, reservation_time DESC"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(status.map(ReservationStatus::as_str))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn for_date(&self, day: NaiveDate) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM bistro.reservation
             WHERE reservation_date = $1
             ORDER BY reservation_time"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(day)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM bistro.reservation
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn stats(&self) -> Result<ReservationStats, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM bistro.reservation GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ReservationStats::from_counts(parse_status_counts(rows)?))
    }

    async fn update_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        table_number: Option<&str>,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let sql = format!(
            "UPDATE bistro.reservation
             SET status = $1, table_number = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING {RESERVATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(status.as_str())
            .bind(table_number)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, reservation: &NewReservation) -> Result<Reservation, RepositoryError> {
        let sql = format!(
            "INSERT INTO bistro.reservation (
                 confirmation_code, customer_name, customer_email, customer_phone,
                 reservation_date, reservation_time, party_size, special_requests, status
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {RESERVATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&reservation.confirmation_code)
            .bind(&reservation.customer_name)
            .bind(&reservation.customer_email)
            .bind(&reservation.customer_phone)
            .bind(reservation.reservation_date)
            .bind(reservation.reservation_time)
            .bind(reservation.party_size)
            .bind(reservation.special_requests.as_deref())
            .bind(reservation.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "confirmation code"))?;

        row.try_into()
    }
}
