//! Login, logout and the role gate, driven through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use bistro_core::AdminRole;
use bistro_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints_need_no_session() {
    let app = TestApp::new();
    let mut client = app.client();

    let live = client.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = client.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_pages_redirect_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    for path in ["/", "/reservations", "/menu", "/settings"] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "GET {path}");
        assert_eq!(response.location(), Some("/login"), "GET {path}");
    }
}

#[tokio::test]
async fn test_wrong_password_is_rejected_with_generic_message() {
    let app = TestApp::new();
    app.create_user("maria", AdminRole::Admin).await;
    let mut client = app.client();

    let response = client.login("maria", "not the password").await;
    assert_eq!(response.location(), Some("/login"));

    let page = client.get("/login").await;
    assert!(page.body.contains("Invalid username or password."));

    let unknown = client.login("nobody", "whatever12345").await;
    assert_eq!(unknown.location(), Some("/login"));
    let page = client.get("/login").await;
    assert!(page.body.contains("Invalid username or password."));

    assert_eq!(client.get("/").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_login_without_csrf_token_is_refused() {
    let app = TestApp::new();
    app.create_user("maria", AdminRole::Admin).await;
    let mut client = app.client();

    // Load the form so the session has a token, then omit it.
    client.get("/login").await;
    let response = client
        .post_form(
            "/login",
            &[("username", "maria"), ("password", bistro_integration_tests::TEST_PASSWORD)],
        )
        .await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(client.get("/").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_login_records_activity_and_shows_dashboard() {
    let app = TestApp::new();
    let mut client = app.logged_in("maria", AdminRole::Editor).await;

    let dashboard = client.get("/").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("Dashboard"));
    assert!(dashboard.body.contains("maria logged in"));

    let entries = app.db.activity_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "login");
}

#[tokio::test]
async fn test_editor_is_kept_out_of_menu_and_settings() {
    let app = TestApp::new();
    let mut client = app.logged_in("eddie", AdminRole::Editor).await;

    for path in ["/menu", "/settings"] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "GET {path}");
        assert_eq!(response.location(), Some("/"), "GET {path}");
    }

    let dashboard = client.get("/").await;
    assert!(dashboard.body.contains("You do not have permission to access that page."));
    assert!(!dashboard.body.contains(r#"href="/menu""#));
    assert!(!dashboard.body.contains(r#"href="/settings""#));

    // Reservations are open to every role.
    assert_eq!(client.get("/reservations").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_reaches_menu_but_not_settings() {
    let app = TestApp::new();
    let mut client = app.logged_in("ana", AdminRole::Admin).await;

    assert_eq!(client.get("/menu").await.status, StatusCode::OK);
    assert_eq!(client.get("/settings").await.location(), Some("/"));

    let dashboard = client.get("/").await;
    assert!(dashboard.body.contains(r#"href="/menu""#));
    assert!(!dashboard.body.contains(r#"href="/settings""#));
}

#[tokio::test]
async fn test_editor_settings_post_changes_nothing() {
    let app = TestApp::new();
    let mut client = app.logged_in("eddie", AdminRole::Editor).await;
    let token = client.csrf_token_from("/").await;
    let before = app.state.settings().get("site_title").await.unwrap();

    let response = client
        .post_multipart(
            "/settings",
            &[("csrf_token", token.as_str()), ("setting_site_title", "Hijacked")],
            &[],
        )
        .await;

    assert_eq!(response.location(), Some("/"));
    assert_eq!(app.state.settings().get("site_title").await.unwrap(), before);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = TestApp::new();
    let mut client = app.logged_in("maria", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/").await;

    let response = client.post_form("/logout", &[("csrf_token", token.as_str())]).await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(client.get("/").await.location(), Some("/login"));

    let actions: Vec<String> = app
        .db
        .activity_entries()
        .await
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, ["login", "logout"]);
}
