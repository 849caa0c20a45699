//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Auth
//! GET  /login                     - Login page
//! POST /login                     - Username/password login
//! POST /logout                    - Logout
//!
//! # Dashboard (any role)
//! GET  /                          - Counts, recent reservations, activity
//!
//! # Reservations (any role)
//! GET  /reservations              - Listing (?status=<status>), stats, today
//! POST /reservations              - Add a manual reservation
//! POST /reservations/status       - Change status and table
//!
//! # Menu (admin and above)
//! GET  /menu                      - Categories and items
//! POST /menu/categories           - Add category
//! POST /menu/items                - Add item (multipart, optional image)
//! POST /menu/items/{id}/delete    - Delete item
//!
//! # Settings (super admin only)
//! GET  /settings                  - Settings form
//! POST /settings                  - Update settings (multipart, optional logo)
//! ```
//!
//! Every POST checks the session CSRF token before touching anything, then
//! answers with a redirect carrying a one-shot flash message.

pub mod auth;
pub mod dashboard;
pub mod forms;
pub mod health;
pub mod menu;
pub mod reservations;
pub mod settings;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{flash_error, flash_success, issue_csrf_token, take_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

pub use dashboard::AdminUserView;

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(reservations::router())
        .merge(menu::router())
        .merge(settings::router())
}

// =============================================================================
// Shared Page Data
// =============================================================================

/// Data every authenticated page renders in its chrome.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub csrf_token: String,
    pub flash: Flash,
}

impl PageContext {
    /// Issue (or reuse) the CSRF token and consume pending flash messages.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn load(
        session: &Session,
        admin: &CurrentAdmin,
        current_path: &'static str,
    ) -> Result<Self, AppError> {
        let csrf_token = issue_csrf_token(session).await?;
        let flash = take_flash(session).await;

        Ok(Self {
            admin_user: AdminUserView::from(admin),
            current_path,
            csrf_token,
            flash,
        })
    }
}

/// Render a template; a render failure becomes a reported 500.
pub fn render_page<T: askama::Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => axum::response::Html(html).into_response(),
        Err(e) => AppError::Render(e).into_response(),
    }
}

// =============================================================================
// Post/Redirect/Get
// =============================================================================

/// Finish a form POST: flash the outcome and redirect.
///
/// Success flashes the message and returns to `back`. Errors are reported,
/// flashed with their user-facing text and also return to `back`, except
/// `Unauthorized` (to `/login`) and `Forbidden` (to `/`).
pub async fn redirect_with_outcome(
    session: &Session,
    back: &str,
    outcome: Result<String, AppError>,
) -> Response {
    match outcome {
        Ok(message) => {
            flash_success(session, message).await;
            Redirect::to(back).into_response()
        }
        Err(AppError::Unauthorized) => AppError::Unauthorized.into_response(),
        Err(err) => {
            err.report();
            flash_error(session, err.user_message()).await;
            let target = if matches!(err, AppError::Forbidden) {
                "/"
            } else {
                back
            };
            Redirect::to(target).into_response()
        }
    }
}
