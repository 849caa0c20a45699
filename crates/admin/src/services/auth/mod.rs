//! Admin authentication service.
//!
//! Username and password login against Argon2id hashes.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use bistro_core::{AdminRole, Email};

use crate::db::{AdminUserRepository, RepositoryError};
use crate::models::admin_user::{AdminUser, NewAdminUser};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 10;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: &'a dyn AdminUserRepository,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn AdminUserRepository) -> Self {
        Self { users }
    }

    /// Verify a username and password and stamp the login time.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown user or
    /// wrong password, and `AdminAuthError::Inactive` for a disabled account.
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let user = self
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if !user.is_active {
            return Err(AdminAuthError::Inactive);
        }

        self.users.record_login(user.id).await?;
        Ok(user)
    }

    /// Create a staff account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail`, `AdminAuthError::WeakPassword`
    /// or `AdminAuthError::UserAlreadyExists` for bad input.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let new_user = NewAdminUser {
            username: username.trim().to_string(),
            email,
            full_name: full_name.trim().to_string(),
            role,
            password_hash: hash_password(password)?,
        };

        self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
            other => AdminAuthError::Repository(other),
        })
    }
}

/// Check password requirements.
fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryDatabase;

    #[tokio::test]
    async fn test_login_round_trip() {
        let db = MemoryDatabase::new();
        let repos = db.repositories();
        let auth = AdminAuthService::new(repos.admin_users.as_ref());

        auth.create_admin("maria", "maria@bistro.test", "Maria Lopez", AdminRole::Admin, "correct horse battery")
            .await
            .unwrap();

        let user = auth.login("maria", "correct horse battery").await.unwrap();
        assert_eq!(user.role, AdminRole::Admin);

        let stored = repos.admin_users.get_by_username("maria").await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let db = MemoryDatabase::new();
        let repos = db.repositories();
        let auth = AdminAuthService::new(repos.admin_users.as_ref());
        auth.create_admin("sam", "sam@bistro.test", "Sam", AdminRole::Editor, "long enough pw")
            .await
            .unwrap();

        assert!(matches!(
            auth.login("sam", "wrong password").await,
            Err(AdminAuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "long enough pw").await,
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db = MemoryDatabase::new();
        let repos = db.repositories();
        let auth = AdminAuthService::new(repos.admin_users.as_ref());

        let result = auth
            .create_admin("sam", "sam@bistro.test", "Sam", AdminRole::Editor, "short")
            .await;
        assert!(matches!(result, Err(AdminAuthError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = MemoryDatabase::new();
        let repos = db.repositories();
        let auth = AdminAuthService::new(repos.admin_users.as_ref());
        auth.create_admin("sam", "sam@bistro.test", "Sam", AdminRole::Editor, "long enough pw")
            .await
            .unwrap();

        let result = auth
            .create_admin("sam", "other@bistro.test", "Sam Two", AdminRole::Editor, "long enough pw")
            .await;
        assert!(matches!(result, Err(AdminAuthError::UserAlreadyExists)));
    }

    #[test]
    fn test_hash_is_argon2id() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }
}
