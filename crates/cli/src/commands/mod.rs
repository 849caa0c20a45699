//! Subcommand implementations.
//!
//! Every command connects with `BISTRO_DATABASE_URL` (falling back to
//! `DATABASE_URL`), loaded from `.env` when present.

pub mod admin;
pub mod migrate;
pub mod settings;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use bistro_admin::db::RepositoryError;
use bistro_admin::services::AdminAuthError;

/// Errors a subcommand can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: editor, admin, super_admin")]
    InvalidRole(String),

    /// Account creation was refused.
    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Connect to the panel database.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BISTRO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("BISTRO_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(bistro_admin::db::create_pool(&database_url).await?)
}
