//! Authentication and authorization extractors for admin.
//!
//! Roles are totally ordered (`editor < admin < super_admin`); a gate with
//! minimum role `min` admits exactly the admins whose role is `>= min`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::flash_error;
use crate::models::{AdminRole, CurrentAdmin, session_keys};

/// Why a request was turned away at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No admin in the session.
    Unauthenticated,
    /// Logged in, but the role ranks below the requirement.
    Forbidden,
}

/// Check `admin` against a minimum role.
///
/// # Errors
///
/// Returns `AccessDenied::Unauthenticated` when `admin` is `None` and
/// `AccessDenied::Forbidden` when its role ranks below `min`.
pub fn require_role(
    admin: Option<&CurrentAdmin>,
    min: AdminRole,
) -> Result<&CurrentAdmin, AccessDenied> {
    let admin = admin.ok_or(AccessDenied::Unauthenticated)?;
    if admin.role.satisfies(min) {
        Ok(admin)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Rejection returned by the auth extractors.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// Redirect to the dashboard; a flash message explains why.
    Forbidden,
    /// Session layer missing from the router.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Forbidden => Redirect::to("/").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Whether the session holds a logged-in admin.
pub async fn is_authenticated(session: &Session) -> bool {
    current_admin(session).await.is_some()
}

/// The logged-in admin, if any.
pub async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

async fn gate(parts: &Parts, min: AdminRole) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::MissingSession)?;

    let admin = current_admin(session).await;
    match require_role(admin.as_ref(), min) {
        Ok(admin) => Ok(admin.clone()),
        Err(AccessDenied::Unauthenticated) => Err(AdminAuthRejection::RedirectToLogin),
        Err(AccessDenied::Forbidden) => {
            tracing::info!(
                path = %parts.uri.path(),
                required = %min,
                "Access denied for insufficient role"
            );
            flash_error(session, "You do not have permission to access that page.").await;
            Err(AdminAuthRejection::Forbidden)
        }
    }
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $min:expr) => {
        $(#[$meta])*
        pub struct $name(pub CurrentAdmin);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = AdminAuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                gate(parts, $min).await.map(Self)
            }
        }
    };
}

role_extractor!(
    /// Extractor that requires any logged-in admin.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// async fn protected_handler(
    ///     RequireAdminAuth(admin): RequireAdminAuth,
    /// ) -> impl IntoResponse {
    ///     format!("Hello, {}!", admin.full_name)
    /// }
    /// ```
    RequireAdminAuth,
    AdminRole::Editor
);

role_extractor!(
    /// Extractor that requires the `admin` role or higher (editors are turned away).
    RequireAdmin,
    AdminRole::Admin
);

role_extractor!(
    /// Extractor that requires the `super_admin` role.
    RequireSuperAdmin,
    AdminRole::SuperAdmin
);

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

#[cfg(test)]
mod tests {
    use bistro_core::AdminUserId;

    use super::*;

    fn admin(role: AdminRole) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new(1),
            username: "pat".to_string(),
            full_name: "Pat".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_matches_rank_order() {
        for current in AdminRole::ALL {
            for min in AdminRole::ALL {
                let who = admin(current);
                let result = require_role(Some(&who), min);
                assert_eq!(result.is_ok(), current.rank() >= min.rank(), "{current} vs {min}");
                if result.is_err() {
                    assert_eq!(result, Err(AccessDenied::Forbidden));
                }
            }
        }
    }

    #[test]
    fn test_editor_cannot_reach_super_admin_gate() {
        let editor = admin(AdminRole::Editor);
        assert_eq!(
            require_role(Some(&editor), AdminRole::SuperAdmin),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        assert_eq!(
            require_role(None, AdminRole::Editor),
            Err(AccessDenied::Unauthenticated)
        );
    }
}
