//! Integration tests for the Bistro admin panel.
//!
//! The full router (sessions, auth gate, CSRF, handlers, templates) runs
//! in-process over the in-memory repositories and a `MemoryStore` session
//! store, so no database or server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bistro-integration-tests
//! ```
//!
//! [`TestApp`] owns the router and the backing tables; [`TestClient`]
//! carries one browser's session cookie between requests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{NaiveDate, NaiveTime};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use bistro_admin::config::AdminConfig;
use bistro_admin::db::memory::MemoryDatabase;
use bistro_admin::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use bistro_admin::models::{NewReservation, Reservation};
use bistro_admin::services::AdminAuthService;
use bistro_admin::state::AppState;
use bistro_core::{AdminRole, ReservationStatus};

/// Password given to every account created by [`TestApp::create_user`].
pub const TEST_PASSWORD: &str = "correct horse battery";

const MULTIPART_BOUNDARY: &str = "bistro-test-boundary";

/// The panel wired over in-memory tables.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: Arc<MemoryDatabase>,
    uploads: TempDir,
}

impl TestApp {
    /// Fresh panel with the default settings seeded and no users.
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = AdminConfig::for_tests(uploads.path().to_path_buf());
        let db = MemoryDatabase::seeded();
        let state = AppState::new(config.clone(), None, db.repositories()).unwrap();
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let router = bistro_admin::app(state.clone(), session_layer);

        Self {
            router,
            state,
            db,
            uploads,
        }
    }

    /// Create an active account with [`TEST_PASSWORD`].
    pub async fn create_user(&self, username: &str, role: AdminRole) {
        AdminAuthService::new(self.state.repos().admin_users.as_ref())
            .create_admin(
                username,
                &format!("{username}@bistro.test"),
                username,
                role,
                TEST_PASSWORD,
            )
            .await
            .unwrap();
    }

    /// Root directory that uploads are written to.
    pub fn uploads_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Names of the files stored under `uploads/<directory>`, sorted.
    pub fn uploaded_files(&self, directory: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.uploads_dir().join(directory)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// A client with no session.
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Create an account and return a client logged in as it.
    pub async fn logged_in(&self, username: &str, role: AdminRole) -> TestClient {
        self.create_user(username, role).await;
        let mut client = self.client();
        let response = client.login(username, TEST_PASSWORD).await;
        assert_eq!(response.location(), Some("/"), "login failed for {username}");
        client
    }

    /// Insert a pending reservation for two directly into the table.
    pub async fn add_reservation(&self, name: &str) -> Reservation {
        self.state
            .repos()
            .reservations
            .create(&NewReservation {
                confirmation_code: format!("RES-20260301-{:04}", name.len()),
                customer_name: name.to_string(),
                customer_email: "guest@example.com".to_string(),
                customer_phone: "555-0100".to_string(),
                reservation_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                reservation_time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                party_size: 2,
                special_requests: None,
                status: ReservationStatus::Pending,
            })
            .await
            .unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    location: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The CSRF token embedded in a rendered form.
    pub fn csrf_token(&self) -> String {
        csrf_token_in(&self.body).unwrap_or_else(|| panic!("no csrf token in page: {}", self.body))
    }
}

/// A small, valid PNG image.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([120, 60, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Pull the `csrf_token` hidden input's value out of a page.
pub fn csrf_token_in(html: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// One browser: sends requests through the router and keeps the session cookie.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Whether the client currently holds a session cookie.
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form. Files are `(field, file_name, bytes)`.
    pub async fn post_multipart(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> TestResponse {
        let request = self
            .request("POST", path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();
        self.send(request).await
    }

    /// Fetch the login form, then submit the credentials with its token.
    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        let page = self.get("/login").await;
        assert_eq!(page.status, StatusCode::OK);
        let token = page.csrf_token();
        self.post_form(
            "/login",
            &[
                ("csrf_token", token.as_str()),
                ("username", username),
                ("password", password),
            ],
        )
        .await
    }

    /// Load `path` and return its CSRF token.
    pub async fn csrf_token_from(&mut self, path: &str) -> String {
        let page = self.get(path).await;
        assert_eq!(page.status, StatusCode::OK, "GET {path}");
        page.csrf_token()
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Some(pair) = value.to_str().ok().and_then(|v| v.split(';').next()) else {
                continue;
            };
            if let Some(id) = pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = (!id.is_empty()).then(|| pair.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
