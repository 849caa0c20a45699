//! Reservation updates: CSRF protection and a failing activity log.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use bistro_core::{AdminRole, ReservationStatus};
use bistro_integration_tests::TestApp;

#[tokio::test]
async fn test_tampered_csrf_token_changes_nothing() {
    let app = TestApp::new();
    let reservation = app.add_reservation("Grace Hopper").await;
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;
    let activity_before = app.db.activity_entries().await.len();

    let mut tampered = token.clone();
    tampered.replace_range(0..1, if token.starts_with('0') { "1" } else { "0" });
    let id = reservation.id.to_string();

    for candidate in [tampered.as_str(), ""] {
        let response = client
            .post_form(
                "/reservations/status",
                &[
                    ("csrf_token", candidate),
                    ("reservation_id", id.as_str()),
                    ("status", "confirmed"),
                    ("table_number", "7"),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/reservations"));
    }

    let stored = app.db.reservation(reservation.id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
    assert_eq!(stored.table_number, None);
    assert_eq!(app.db.activity_entries().await.len(), activity_before);

    let page = client.get("/reservations").await;
    assert!(page.body.contains("Your session token was invalid."));
}

#[tokio::test]
async fn test_status_update_succeeds_when_activity_log_is_down() {
    let app = TestApp::new();
    let reservation = app.add_reservation("Ada Lovelace").await;
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;

    let id = reservation.id.to_string();

    app.db.set_activity_unavailable(true);
    let activity_before = app.db.activity_entries().await.len();

    let response = client
        .post_form(
            "/reservations/status",
            &[
                ("csrf_token", token.as_str()),
                ("reservation_id", id.as_str()),
                ("status", "seated"),
                ("table_number", "12"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("/reservations"));

    let stored = app.db.reservation(reservation.id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Seated);
    assert_eq!(stored.table_number.as_deref(), Some("12"));
    assert_eq!(app.db.activity_entries().await.len(), activity_before);

    let page = client.get("/reservations").await;
    assert!(page.body.contains("Reservation updated successfully."));
}

#[tokio::test]
async fn test_confirming_records_activity() {
    let app = TestApp::new();
    let reservation = app.add_reservation("Alan Turing").await;
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;
    let id = reservation.id.to_string();

    client
        .post_form(
            "/reservations/status",
            &[
                ("csrf_token", token.as_str()),
                ("reservation_id", id.as_str()),
                ("status", "confirmed"),
            ],
        )
        .await;

    let stored = app.db.reservation(reservation.id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);

    let last = app.db.activity_entries().await.pop().unwrap();
    assert_eq!(last.action, "update_reservation");
    assert_eq!(
        last.description,
        format!("Updated reservation #{} to confirmed", reservation.id)
    );
}

#[tokio::test]
async fn test_unknown_reservation_is_reported() {
    let app = TestApp::new();
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;

    client
        .post_form(
            "/reservations/status",
            &[
                ("csrf_token", token.as_str()),
                ("reservation_id", "999"),
                ("status", "seated"),
            ],
        )
        .await;

    let page = client.get("/reservations").await;
    assert!(page.body.contains("Reservation #999 not found."));
}

#[tokio::test]
async fn test_manual_reservation_is_listed() {
    let app = TestApp::new();
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;

    let response = client
        .post_form(
            "/reservations",
            &[
                ("csrf_token", token.as_str()),
                ("customer_name", "Katherine Johnson"),
                ("customer_email", "kj@example.com"),
                ("customer_phone", "555-0199"),
                ("reservation_date", "2026-05-02"),
                ("reservation_time", "20:15"),
                ("party_size", "4"),
                ("special_requests", "Window seat"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("/reservations"));

    let page = client.get("/reservations").await;
    assert!(page.body.contains("Reservation added successfully."));
    assert!(page.body.contains("Katherine Johnson"));
    assert!(page.body.contains("May 2, 2026"));
    assert!(page.body.contains("8:15 PM"));

    let filtered = client.get("/reservations?status=cancelled").await;
    assert!(!filtered.body.contains("Katherine Johnson"));
}

#[tokio::test]
async fn test_invalid_manual_reservation_lists_every_problem() {
    let app = TestApp::new();
    let mut client = app.logged_in("maria", AdminRole::Editor).await;
    let token = client.csrf_token_from("/reservations").await;

    client
        .post_form(
            "/reservations",
            &[
                ("csrf_token", token.as_str()),
                ("customer_name", ""),
                ("customer_email", "kj@example.com"),
                ("reservation_date", "2026-05-02"),
                ("reservation_time", "20:15"),
                ("party_size", "0"),
            ],
        )
        .await;

    let page = client.get("/reservations").await;
    assert!(page.body.contains("Customer name is required."));
    assert!(page.body.contains("Party size must be at least 1."));
    assert!(page.body.contains("No reservations match this filter."));
}
