//! Reservation domain types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;

use bistro_core::{ReservationId, ReservationStatus};

const CODE_PREFIX: &str = "JF";
const CODE_SUFFIX_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A table reservation.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub confirmation_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub table_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a manually entered reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub confirmation_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
}

/// Reservation counts, overall and per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub seated: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl ReservationStats {
    /// Build from `(status, count)` pairs.
    pub fn from_counts(counts: impl IntoIterator<Item = (ReservationStatus, i64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            stats.total += count;
            match status {
                ReservationStatus::Pending => stats.pending += count,
                ReservationStatus::Confirmed => stats.confirmed += count,
                ReservationStatus::Seated => stats.seated += count,
                ReservationStatus::Completed => stats.completed += count,
                ReservationStatus::Cancelled => stats.cancelled += count,
            }
        }
        stats
    }

    #[must_use]
    pub const fn count(&self, status: ReservationStatus) -> i64 {
        match status {
            ReservationStatus::Pending => self.pending,
            ReservationStatus::Confirmed => self.confirmed,
            ReservationStatus::Seated => self.seated,
            ReservationStatus::Completed => self.completed,
            ReservationStatus::Cancelled => self.cancelled,
        }
    }
}

/// Generate a confirmation code: `JF`, the booking day as `YYYYMMDD`, then
/// six uppercase alphanumerics.
#[must_use]
pub fn generate_confirmation_code(day: NaiveDate) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    format!("{CODE_PREFIX}{}{suffix}", day.format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_code_shape() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let code = generate_confirmation_code(day);

        assert_eq!(code.len(), 16);
        assert!(code.starts_with("JF20250314"));
        assert!(
            code[10..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_stats_from_counts() {
        let stats = ReservationStats::from_counts([
            (ReservationStatus::Pending, 3),
            (ReservationStatus::Confirmed, 2),
            (ReservationStatus::Cancelled, 1),
        ]);

        assert_eq!(stats.total, 6);
        assert_eq!(stats.count(ReservationStatus::Pending), 3);
        assert_eq!(stats.count(ReservationStatus::Seated), 0);
        assert_eq!(stats.cancelled, 1);
    }
}
