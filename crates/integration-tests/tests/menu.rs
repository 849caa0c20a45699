//! Menu management through the router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use bistro_core::AdminRole;
use bistro_integration_tests::{TestApp, png_bytes};

#[tokio::test]
async fn test_category_item_and_delete() {
    let app = TestApp::new();
    let mut client = app.logged_in("chef", AdminRole::Admin).await;
    let token = client.csrf_token_from("/menu").await;

    let response = client
        .post_form(
            "/menu/categories",
            &[("csrf_token", token.as_str()), ("name", "Main Courses"), ("display_order", "2")],
        )
        .await;
    assert_eq!(response.location(), Some("/menu"));

    let response = client
        .post_multipart(
            "/menu/items",
            &[
                ("csrf_token", token.as_str()),
                ("category_id", "1"),
                ("name", "Steak Frites"),
                ("price", "24.50"),
                ("dietary_tags[]", "gluten-free"),
                ("active", "1"),
            ],
            &[("image", "steak.png", b"not really a png")],
        )
        .await;
    assert_eq!(response.location(), Some("/menu"));

    let items = app.db.menu_items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Steak Frites");
    assert_eq!(items[0].image_url, None);
    assert!(items[0].is_active);
    assert!(!items[0].is_featured);

    let page = client.get("/menu").await;
    assert!(page.body.contains("Menu item added successfully."));
    assert!(page.body.contains("Image skipped: The uploaded file is not a valid image."));
    assert!(page.body.contains("$24.50"));
    assert!(page.body.contains("main-courses"));

    let id = items[0].id.to_string();
    let response = client
        .post_form(&format!("/menu/items/{id}/delete"), &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(response.location(), Some("/menu"));
    assert!(app.db.menu_items().await.is_empty());

    let actions: Vec<String> = app
        .db
        .activity_entries()
        .await
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        ["login", "add_category", "add_menu_item", "delete_menu_item"]
    );
}

#[tokio::test]
async fn test_duplicate_category_is_a_form_error() {
    let app = TestApp::new();
    let mut client = app.logged_in("chef", AdminRole::Admin).await;
    let token = client.csrf_token_from("/menu").await;

    for _ in 0..2 {
        client
            .post_form("/menu/categories", &[("csrf_token", token.as_str()), ("name", "Desserts")])
            .await;
    }

    let page = client.get("/menu").await;
    assert!(page.body.contains("A category with this name already exists."));
}

#[tokio::test]
async fn test_item_for_missing_category_is_rejected() {
    let app = TestApp::new();
    let mut client = app.logged_in("chef", AdminRole::Admin).await;
    let token = client.csrf_token_from("/menu").await;

    client
        .post_multipart(
            "/menu/items",
            &[
                ("csrf_token", token.as_str()),
                ("category_id", "42"),
                ("name", "Ghost Dish"),
                ("price", "9.00"),
            ],
            &[("image", "ghost.png", png_bytes().as_slice())],
        )
        .await;

    assert!(app.db.menu_items().await.is_empty());
    assert!(app.uploaded_files("menu").is_empty());
    let page = client.get("/menu").await;
    assert!(page.body.contains("The selected category does not exist."));
}

#[tokio::test]
async fn test_item_image_is_stored_and_served() {
    let app = TestApp::new();
    let mut client = app.logged_in("chef", AdminRole::Admin).await;
    let token = client.csrf_token_from("/menu").await;
    client
        .post_form("/menu/categories", &[("csrf_token", token.as_str()), ("name", "Starters")])
        .await;

    let response = client
        .post_multipart(
            "/menu/items",
            &[
                ("csrf_token", token.as_str()),
                ("category_id", "1"),
                ("name", "Oysters"),
                ("price", "18.00"),
            ],
            &[("image", "oysters.png", png_bytes().as_slice())],
        )
        .await;
    assert_eq!(response.location(), Some("/menu"));

    let files = app.uploaded_files("menu");
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_oysters.png"), "{files:?}");

    let items = app.db.menu_items().await;
    let image_url = items[0].image_url.clone().unwrap();
    assert_eq!(image_url, format!("/uploads/menu/{}", files[0]));

    let page = client.get("/menu").await;
    assert!(page.body.contains("Menu item added successfully."));
    assert!(!page.body.contains("Image skipped"));

    let served = client.get(&image_url).await;
    assert_eq!(served.status, StatusCode::OK);
}

#[tokio::test]
async fn test_same_image_name_never_overwrites() {
    let app = TestApp::new();
    let mut client = app.logged_in("chef", AdminRole::Admin).await;
    let token = client.csrf_token_from("/menu").await;
    client
        .post_form("/menu/categories", &[("csrf_token", token.as_str()), ("name", "Starters")])
        .await;

    for name in ["Soup", "Salad"] {
        client
            .post_multipart(
                "/menu/items",
                &[
                    ("csrf_token", token.as_str()),
                    ("category_id", "1"),
                    ("name", name),
                    ("price", "7.00"),
                ],
                &[("image", "dish.png", png_bytes().as_slice())],
            )
            .await;
    }

    assert_eq!(app.uploaded_files("menu").len(), 2);
    let items = app.db.menu_items().await;
    assert_eq!(items.len(), 2);
    assert_ne!(items[0].image_url, items[1].image_url);
}
