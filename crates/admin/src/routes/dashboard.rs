//! Dashboard route handler.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use tower_sessions::Session;
use tracing::instrument;

use bistro_core::AdminRole;

use super::reservations::ReservationView;
use super::{PageContext, render_page};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{ActivityEntry, CurrentAdmin, DashboardStats};
use crate::state::AppState;

const RECENT_RESERVATIONS: i64 = 5;
const RECENT_ACTIVITY: i64 = 10;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub username: String,
    pub role_label: &'static str,
    /// May manage the menu.
    pub is_admin: bool,
    /// May change site settings.
    pub is_super_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.full_name.clone(),
            username: admin.username.clone(),
            role_label: admin.role.label(),
            is_admin: admin.role.satisfies(AdminRole::Admin),
            is_super_admin: admin.role.satisfies(AdminRole::SuperAdmin),
        }
    }
}

/// Activity item for the dashboard feed.
#[derive(Debug, Clone)]
pub struct ActivityView {
    pub actor: String,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ActivityEntry> for ActivityView {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            actor: entry.actor().to_string(),
            action: entry.action.clone(),
            description: entry.description.clone(),
            created_at: entry.created_at,
        }
    }
}

/// A labelled count for the breakdown tables.
#[derive(Debug, Clone)]
pub struct CountView {
    pub label: String,
    pub count: i64,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub stats: DashboardStats,
    pub by_status: Vec<CountView>,
    pub by_category: Vec<CountView>,
    pub recent_reservations: Vec<ReservationView>,
    pub recent_activity: Vec<ActivityView>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    match load(&admin, &state, &session).await {
        Ok(template) => render_page(&template),
        Err(e) => e.into_response(),
    }
}

async fn load(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
) -> Result<DashboardTemplate, AppError> {
    let repos = state.repos();
    let (stats, recent, activity) = tokio::try_join!(
        repos.dashboard.stats(),
        repos.reservations.recent(RECENT_RESERVATIONS),
        repos.activity.recent(RECENT_ACTIVITY),
    )?;

    let by_status = stats
        .reservations_by_status
        .iter()
        .map(|(status, count)| CountView {
            label: status.label().to_string(),
            count: *count,
        })
        .collect();
    let by_category = stats
        .items_by_category
        .iter()
        .map(|(name, count)| CountView {
            label: name.clone(),
            count: *count,
        })
        .collect();

    Ok(DashboardTemplate {
        page: PageContext::load(session, admin, "/").await?,
        stats,
        by_status,
        by_category,
        recent_reservations: recent.iter().map(ReservationView::from).collect(),
        recent_activity: activity.iter().map(ActivityView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use bistro_core::AdminUserId;

    use super::*;

    #[test]
    fn test_admin_user_view_capabilities() {
        let view = |role| {
            AdminUserView::from(&CurrentAdmin {
                id: AdminUserId::new(1),
                username: "sam".into(),
                full_name: "Sam Fry".into(),
                role,
            })
        };

        let editor = view(AdminRole::Editor);
        assert!(!editor.is_admin && !editor.is_super_admin);

        let admin = view(AdminRole::Admin);
        assert!(admin.is_admin && !admin.is_super_admin);

        let owner = view(AdminRole::SuperAdmin);
        assert!(owner.is_admin && owner.is_super_admin);
        assert_eq!(owner.role_label, "Super Admin");
    }
}
