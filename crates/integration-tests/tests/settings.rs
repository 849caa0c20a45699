//! Settings form: round trip, rejection of unknown keys, logo uploads.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use bistro_core::AdminRole;
use bistro_integration_tests::{TestApp, png_bytes};

#[tokio::test]
async fn test_settings_round_trip() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    let response = client
        .post_multipart(
            "/settings",
            &[
                ("csrf_token", token.as_str()),
                ("setting_site_title", "Chez Test"),
                ("setting_contact_email", "hello@chez.test"),
                ("setting_opening_hours[lunch][mon_fri]", "Noon - 3:00 PM"),
                ("setting_social_media[instagram]", "https://instagram.com/cheztest"),
            ],
            &[],
        )
        .await;
    assert_eq!(response.location(), Some("/settings"));

    let settings = app.state.settings();
    assert_eq!(settings.get("site_title").await.unwrap(), "Chez Test");
    assert_eq!(settings.get("contact_email").await.unwrap(), "hello@chez.test");

    let hours = settings.opening_hours().await.unwrap();
    assert_eq!(hours.lunch.mon_fri, "Noon - 3:00 PM");
    assert_eq!(hours.dinner.fri_sat, "5:30 PM - 11:00 PM");

    let social = settings.social_links().await.unwrap();
    assert_eq!(social.instagram, "https://instagram.com/cheztest");

    let page = client.get("/settings").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Settings updated successfully."));
    assert!(page.body.contains(r#"value="Chez Test""#));

    let last = app.db.activity_entries().await.pop().unwrap();
    assert_eq!(last.action, "update_settings");
}

#[tokio::test]
async fn test_unknown_key_rejects_whole_submission() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;
    let before = app.state.settings().get("site_title").await.unwrap();

    client
        .post_multipart(
            "/settings",
            &[
                ("csrf_token", token.as_str()),
                ("setting_site_title", "Changed"),
                ("setting_bogus", "x"),
            ],
            &[],
        )
        .await;

    assert_eq!(app.state.settings().get("site_title").await.unwrap(), before);
    let page = client.get("/settings").await;
    assert!(page.body.contains("setting_bogus: unknown setting"));
}

#[tokio::test]
async fn test_logo_path_cannot_be_set_as_text() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    client
        .post_multipart(
            "/settings",
            &[
                ("csrf_token", token.as_str()),
                ("setting_site_logo", "/etc/passwd"),
            ],
            &[],
        )
        .await;

    assert_eq!(app.state.settings().get("site_logo").await.unwrap(), "");
}

#[tokio::test]
async fn test_invalid_logo_is_skipped_but_text_is_saved() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    client
        .post_multipart(
            "/settings",
            &[("csrf_token", token.as_str()), ("setting_site_tagline", "Since 1999")],
            &[("site_logo", "logo.png", b"definitely not an image")],
        )
        .await;

    let settings = app.state.settings();
    assert_eq!(settings.get("site_tagline").await.unwrap(), "Since 1999");
    assert_eq!(settings.get("site_logo").await.unwrap(), "");

    let page = client.get("/settings").await;
    assert!(page.body.contains("Logo skipped: The uploaded file is not a valid image."));
    assert!(page.body.contains("Settings updated successfully."));
}

#[tokio::test]
async fn test_valid_logo_is_stored_and_recorded() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    let response = client
        .post_multipart(
            "/settings",
            &[("csrf_token", token.as_str())],
            &[("site_logo", "logo.png", png_bytes().as_slice())],
        )
        .await;
    assert_eq!(response.location(), Some("/settings"));

    let files = app.uploaded_files("site");
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_logo.png"), "{files:?}");
    assert_eq!(
        app.state.settings().get("site_logo").await.unwrap(),
        format!("/uploads/site/{}", files[0])
    );

    let page = client.get("/settings").await;
    assert!(page.body.contains("Settings updated successfully."));
    assert!(!page.body.contains("Logo skipped"));
}

#[tokio::test]
async fn test_logo_removed_when_settings_cannot_be_saved() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    app.db.set_settings_unavailable(true);
    client
        .post_multipart(
            "/settings",
            &[("csrf_token", token.as_str()), ("setting_site_tagline", "Since 1999")],
            &[("site_logo", "logo.png", png_bytes().as_slice())],
        )
        .await;
    app.db.set_settings_unavailable(false);

    assert!(app.uploaded_files("site").is_empty());
    let settings = app.state.settings();
    assert_eq!(settings.get("site_logo").await.unwrap(), "");
    assert_eq!(settings.get("site_tagline").await.unwrap(), "");
}

#[tokio::test]
async fn test_partial_hours_keep_other_days() {
    let app = TestApp::new();
    let mut client = app.logged_in("owner", AdminRole::SuperAdmin).await;
    let token = client.csrf_token_from("/settings").await;

    client
        .post_multipart(
            "/settings",
            &[("csrf_token", token.as_str()), ("setting_opening_hours[dinner][sun]", "Closed")],
            &[],
        )
        .await;
    client
        .post_multipart(
            "/settings",
            &[
                ("csrf_token", token.as_str()),
                ("setting_opening_hours[lunch][mon_fri]", "Noon - 2:00 PM"),
            ],
            &[],
        )
        .await;

    let hours = app.state.settings().opening_hours().await.unwrap();
    assert_eq!(hours.lunch.mon_fri, "Noon - 2:00 PM");
    assert_eq!(hours.dinner.sun, "Closed");
}
