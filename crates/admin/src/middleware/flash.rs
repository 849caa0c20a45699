//! One-shot flash messages carried in the session.

use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a success message for the next rendered page.
pub async fn flash_success(session: &Session, message: impl Into<String>) {
    update(session, |flash| flash.success = Some(message.into())).await;
}

/// Queue an error message for the next rendered page.
pub async fn flash_error(session: &Session, message: impl Into<String>) {
    update(session, |flash| flash.error = Some(message.into())).await;
}

/// Remove and return pending messages.
pub async fn take_flash(session: &Session) -> Flash {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn update(session: &Session, apply: impl FnOnce(&mut Flash)) {
    let mut flash = session
        .get::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    apply(&mut flash);
    if let Err(e) = session.insert(session_keys::FLASH, &flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        flash_success(&session, "Saved.").await;
        flash_error(&session, "Image skipped.").await;

        let flash = take_flash(&session).await;
        assert_eq!(flash.success.as_deref(), Some("Saved."));
        assert_eq!(flash.error.as_deref(), Some("Image skipped."));

        assert!(take_flash(&session).await.is_empty());
    }
}
