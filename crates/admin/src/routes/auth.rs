//! Authentication route handlers for admin.
//!
//! Provides the login form, password login and logout.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::forms::CsrfForm;
use super::{redirect_with_outcome, render_page};
use crate::error::{AppError, GENERIC_FAILURE, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    current_admin, flash_error, is_authenticated, issue_csrf_token, set_current_admin, take_flash,
    validate_csrf_token,
};
use crate::models::{AdminUser, ClientInfo, CurrentAdmin, Flash};
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Shown for unknown users, wrong passwords and disabled accounts alike.
pub const INVALID_LOGIN: &str = "Invalid username or password.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub csrf_token: String,
    pub username: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub csrf_token: String,
    pub flash: Flash,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

// =============================================================================
// Handlers
// =============================================================================

/// Render the login page.
///
/// GET /login
#[instrument(skip(session))]
async fn login_page(session: Session) -> Response {
    if is_authenticated(&session).await {
        return Redirect::to("/").into_response();
    }

    let csrf_token = match issue_csrf_token(&session).await {
        Ok(token) => token,
        Err(e) => return AppError::Session(e).into_response(),
    };

    render_page(&LoginTemplate {
        csrf_token,
        flash: take_flash(&session).await,
    })
}

/// Verify credentials and start an admin session.
///
/// POST /login
#[instrument(skip(state, session, client, form), fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<LoginForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return redirect_with_outcome(&session, "/login", Err(AppError::InvalidCsrf)).await;
    }

    let auth = AdminAuthService::new(state.repos().admin_users.as_ref());
    let user = match auth.login(&form.username, &form.password).await {
        Ok(user) => user,
        Err(AdminAuthError::InvalidCredentials | AdminAuthError::Inactive) => {
            tracing::info!("Rejected login attempt");
            flash_error(&session, INVALID_LOGIN).await;
            return Redirect::to("/login").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            flash_error(&session, GENERIC_FAILURE).await;
            return Redirect::to("/login").into_response();
        }
    };

    if let Err(e) = start_session(&session, &user).await {
        return redirect_with_outcome(&session, "/login", Err(e)).await;
    }

    set_sentry_user(user.id.as_i32(), &user.username);
    state
        .activity()
        .record(
            Some(user.id),
            &client,
            "login",
            format!("{} logged in", user.username),
        )
        .await;

    tracing::info!(role = %user.role, "Admin logged in");
    Redirect::to("/").into_response()
}

/// Store the admin in a session with a fresh id.
async fn start_session(session: &Session, user: &AdminUser) -> Result<(), AppError> {
    session.cycle_id().await?;
    set_current_admin(session, &CurrentAdmin::from(user)).await?;
    Ok(())
}

/// End the admin session.
///
/// POST /logout
#[instrument(skip(state, session, client, form))]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<CsrfForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return redirect_with_outcome(&session, "/", Err(AppError::InvalidCsrf)).await;
    }

    if let Some(admin) = current_admin(&session).await {
        state
            .activity()
            .record(
                Some(admin.id),
                &client,
                "logout",
                format!("{} logged out", admin.username),
            )
            .await;
    }

    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session on logout");
    }
    clear_sentry_user();

    Redirect::to("/login").into_response()
}
