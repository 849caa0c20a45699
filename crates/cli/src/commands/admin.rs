//! Staff account management commands.
//!
//! # Usage
//!
//! ```bash
//! BISTRO_ADMIN_PASSWORD='...' bistro admin create -u maria -e maria@bistro.com -n "Maria Lopez" -r admin
//! ```
//!
//! # Environment Variables
//!
//! - `BISTRO_DATABASE_URL` - `PostgreSQL` connection string
//! - `BISTRO_ADMIN_PASSWORD` - Password for the new account (kept off the
//!   command line so it stays out of shell history)

use secrecy::{ExposeSecret, SecretString};

use bistro_admin::db::PgAdminUserRepository;
use bistro_admin::services::AdminAuthService;
use bistro_core::AdminRole;

use super::{CommandError, connect};

const PASSWORD_ENV: &str = "BISTRO_ADMIN_PASSWORD";

/// Create a new staff account.
///
/// # Arguments
///
/// * `username` - Login name
/// * `email` - Email address
/// * `name` - Display name
/// * `role` - `editor`, `admin` or `super_admin`
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error for an unknown role, a missing or weak password, a
/// taken username or email, or a database failure.
pub async fn create_user(
    username: &str,
    email: &str,
    name: &str,
    role: &str,
) -> Result<i32, CommandError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;
    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(PASSWORD_ENV))?;

    tracing::info!("Creating staff account: {} ({})", username, role);

    let users = PgAdminUserRepository::new(pool);
    let user = AdminAuthService::new(&users)
        .create_admin(username, email, name, role, password.expose_secret())
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );

    Ok(user.id.as_i32())
}
