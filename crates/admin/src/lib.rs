//! Bistro Admin library.
//!
//! Server-rendered administration panel for a single restaurant: table
//! reservations, the menu, site settings and an activity-log dashboard.
//! The crate is a library so the full router can be driven in tests over
//! in-memory repositories.
//!
//! # Security
//!
//! Every page except `/login` and the health checks requires a session.
//! Staff roles are ordered editor < admin < super admin; menu pages need
//! admin and settings need super admin. Every form POST carries a
//! per-session CSRF token.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::services::upload::PUBLIC_PREFIX;
use crate::state::AppState;

/// Directory holding the stylesheet, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Slack on top of the image limit for the other multipart fields.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the full application router.
///
/// Layers, innermost first: sessions, request tracing, Sentry. The body
/// limit is derived from the configured upload size so an oversized image
/// reaches the validator and gets a proper message instead of a bare 413.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let upload_dir = state.config().uploads.dir.clone();
    let body_limit = usize::try_from(state.config().uploads.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .merge(routes::routes())
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
