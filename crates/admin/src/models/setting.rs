//! Stored site settings.

use chrono::{DateTime, Utc};

/// One row of the key-value settings table.
///
/// `value` is always text; structured values are JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub category: String,
    pub updated_at: DateTime<Utc>,
}
