//! Unified error handling for admin.
//!
//! Page handlers return `AppError` through `IntoResponse`. Form handlers
//! turn it into a flash message and a redirect instead (see
//! `routes::redirect_with_outcome`), using [`AppError::user_message`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{SettingsError, UploadRejection};

/// Generic message for failures whose details stay in the logs.
pub const GENERIC_FAILURE: &str = "Something went wrong. No changes were saved.";

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// No admin in the session.
    #[error("not logged in")]
    Unauthorized,

    /// Role ranks below the requirement.
    #[error("forbidden")]
    Forbidden,

    /// CSRF token missing or mismatched.
    #[error("invalid CSRF token")]
    InvalidCsrf,

    /// Bad field value; nothing was applied.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An uploaded file was refused.
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    /// Database operation failed.
    #[error("database error: {0}")]
    Persistence(#[from] RepositoryError),

    /// Settings could not be loaded or saved.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("template error: {0}")]
    Render(#[from] askama::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this is a server-side failure rather than a user mistake.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_)
                | Self::Settings(_)
                | Self::Session(_)
                | Self::Render(_)
                | Self::Internal(_)
        )
    }

    /// Message safe to show in the panel.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Please log in.".to_string(),
            Self::Forbidden => "You do not have permission to do that.".to_string(),
            Self::InvalidCsrf => {
                "Your session token was invalid. Please reload the page and try again.".to_string()
            }
            Self::Validation(message) => message.clone(),
            Self::Upload(rejection) => rejection.to_string(),
            Self::NotFound(what) => format!("{what} not found."),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Log the error, sending server errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else {
            tracing::info!(error = %self, "Admin request rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let status = match &self {
            Self::Unauthorized => return Redirect::to("/login").into_response(),
            Self::Forbidden => return Redirect::to("/").into_response(),
            Self::InvalidCsrf => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        (status, self.user_message()).into_response()
    }
}

/// Set the Sentry user context from the logged-in admin.
pub fn set_sentry_user(admin_user_id: i32, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
