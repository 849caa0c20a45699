//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bistro migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and are embedded at
//! compile time. The session table is part of them.

use super::{CommandError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
