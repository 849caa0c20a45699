//! Settings table seeding.
//!
//! # Usage
//!
//! ```bash
//! bistro settings seed
//! ```
//!
//! Updates never insert rows, so a key must be seeded before the settings
//! page can change it. Existing values are left alone.

use bistro_admin::db::{PgSettingsRepository, SettingsRepository};
use bistro_admin::services::settings::SETTING_OPTIONS;

use super::{CommandError, connect};

/// Insert the default value for every known key that has no row yet.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn seed() -> Result<usize, CommandError> {
    let repo = PgSettingsRepository::new(connect().await?);

    let mut inserted = 0;
    for option in SETTING_OPTIONS {
        if repo
            .insert_if_missing(option.key, &option.default_value(), option.category)
            .await?
        {
            tracing::info!(key = option.key, "Seeded setting");
            inserted += 1;
        }
    }

    tracing::info!(
        inserted,
        skipped = SETTING_OPTIONS.len() - inserted,
        "Settings seeding complete"
    );
    Ok(inserted)
}
