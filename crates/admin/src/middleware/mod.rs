//! HTTP middleware and extractors for admin.
//!
//! - `session` - tower-sessions layer (Postgres store, strict cookies)
//! - `auth` - Role-gated extractors (`RequireAdminAuth`, `RequireAdmin`, `RequireSuperAdmin`)
//! - `csrf` - Per-session CSRF token issue and validation
//! - `flash` - One-shot messages shown on the next page
//! - `client` - Request origin (`ClientInfo`) for the activity log

pub mod auth;
pub mod client;
pub mod csrf;
pub mod flash;
pub mod session;

pub use auth::{
    AccessDenied, AdminAuthRejection, RequireAdmin, RequireAdminAuth, RequireSuperAdmin,
    current_admin, is_authenticated, require_role, set_current_admin,
};
pub use csrf::{CSRF_FIELD, issue_csrf_token, require_csrf, validate_csrf_token};
pub use flash::{flash_error, flash_success, take_flash};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, postgres_store};
