//! Per-session CSRF tokens.
//!
//! A token is 32 random bytes, hex encoded, created on first use and kept
//! for the rest of the session. Validation compares in constant time and
//! fails closed when the session has no token or cannot be read.

use rand::RngCore;
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

const TOKEN_BYTES: usize = 32;

/// Return the session's token, creating it on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn issue_csrf_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(session_keys::CSRF_TOKEN).await? {
        return Ok(token);
    }

    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    session.insert(session_keys::CSRF_TOKEN, &token).await?;
    Ok(token)
}

/// Whether `candidate` equals the session's token.
pub async fn validate_csrf_token(session: &Session, candidate: &str) -> bool {
    match session.get::<String>(session_keys::CSRF_TOKEN).await {
        Ok(Some(expected)) => tokens_match(&expected, candidate),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read CSRF token from session");
            false
        }
    }
}

/// Reject the request unless `candidate` matches.
///
/// # Errors
///
/// Returns `AppError::InvalidCsrf` on mismatch or absence.
pub async fn require_csrf(session: &Session, candidate: &str) -> Result<(), AppError> {
    if validate_csrf_token(session, candidate).await {
        Ok(())
    } else {
        Err(AppError::InvalidCsrf)
    }
}

fn tokens_match(expected: &str, candidate: &str) -> bool {
    !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(candidate.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_issue_is_idempotent() {
        let session = session();
        let first = issue_csrf_token(&session).await.unwrap();
        let second = issue_csrf_token(&session).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_tokens() {
        let a = issue_csrf_token(&session()).await.unwrap();
        let b = issue_csrf_token(&session()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_validate_accepts_exact_token() {
        let session = session();
        let token = issue_csrf_token(&session).await.unwrap();
        assert!(validate_csrf_token(&session, &token).await);
    }

    #[tokio::test]
    async fn test_well_formed_wrong_token_rejected() {
        let session = session();
        let token = issue_csrf_token(&session).await.unwrap();

        let mut tampered = token.clone().into_bytes();
        tampered[0] = if tampered[0] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(tampered.len(), token.len());
        assert!(!validate_csrf_token(&session, &tampered).await);
        assert!(!validate_csrf_token(&session, &token[..63]).await);
    }

    #[tokio::test]
    async fn test_missing_session_token_fails_closed() {
        let session = session();
        assert!(!validate_csrf_token(&session, "").await);
        assert!(!validate_csrf_token(&session, "00").await);
        assert!(matches!(require_csrf(&session, "").await, Err(AppError::InvalidCsrf)));
    }
}
