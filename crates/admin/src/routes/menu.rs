//! Menu management route handlers.
//!
//! Admin role or higher. Editors are sent back to the dashboard.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bistro_core::{MenuCategoryId, MenuItemId, Price, Slug};

use super::forms::{CsrfForm, MultipartForm};
use super::{PageContext, redirect_with_outcome, render_page};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, flash_error, require_csrf};
use crate::models::{
    ClientInfo, CurrentAdmin, MenuCategory, MenuItem, NewMenuCategory, NewMenuItem,
};
use crate::services::{AcceptedFile, UploadDirectory, UploadedFile};
use crate::state::AppState;

const BACK: &str = "/menu";

/// Dietary tags offered on the item form.
pub const DIETARY_TAGS: [&str; 5] = ["vegetarian", "vegan", "gluten-free", "dairy-free", "spicy"];

// =============================================================================
// Form Types
// =============================================================================

/// New category form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub csrf_token: String,
    pub name: String,
    pub description: String,
    pub display_order: String,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank name or bad display order.
    pub fn validate(&self) -> Result<NewMenuCategory, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required.".to_string()));
        }

        Ok(NewMenuCategory {
            name: name.to_string(),
            slug: Slug::from_name(name),
            description: self.description.trim().to_string(),
            display_order: parse_display_order(&self.display_order)?,
        })
    }
}

/// Validate the text fields of the multipart item form.
///
/// # Errors
///
/// Returns `AppError::Validation` listing each invalid field.
pub fn validate_item(form: &MultipartForm) -> Result<NewMenuItem, AppError> {
    let mut errors = Vec::new();

    let category_id = form
        .trimmed("category_id")
        .parse::<i32>()
        .map(MenuCategoryId::new)
        .map_err(|_| errors.push("Choose a category.".to_string()))
        .ok();

    let name = form.trimmed("name");
    if name.is_empty() {
        errors.push("Item name is required.".to_string());
    }

    let price = Price::parse(&form.trimmed("price"))
        .map_err(|e| errors.push(format!("Price: {e}.")))
        .ok();

    let display_order = parse_display_order(&form.trimmed("display_order"))
        .map_err(|e| errors.push(e.user_message()))
        .ok();

    let dietary_tags: Vec<String> = form
        .all("dietary_tags[]")
        .chain(form.all("dietary_tags"))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    match (category_id, price, display_order) {
        (Some(category_id), Some(price), Some(display_order)) if errors.is_empty() => {
            Ok(NewMenuItem {
                category_id,
                name,
                description: form.trimmed("description"),
                price,
                image_url: None,
                dietary_tags,
                is_featured: form.is_checked("featured"),
                is_active: form.is_checked("active"),
                display_order,
            })
        }
        _ => Err(AppError::Validation(errors.join(" "))),
    }
}

/// Blank means 0.
fn parse_display_order(raw: &str) -> Result<i32, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i32>()
        .map_err(|_| AppError::Validation("Display order must be a whole number.".to_string()))
}

/// Surface constraint violations as form errors.
fn conflict_as_validation(err: RepositoryError, message: &str) -> AppError {
    match err {
        RepositoryError::Conflict(_) => AppError::Validation(message.to_string()),
        other => AppError::Persistence(other),
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Category row for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub display_order: i32,
    pub item_count: i64,
}

impl From<&MenuCategory> for CategoryView {
    fn from(c: &MenuCategory) -> Self {
        Self {
            id: c.id.as_i32(),
            name: c.name.clone(),
            slug: c.slug.to_string(),
            description: c.description.clone(),
            display_order: c.display_order,
            item_count: c.item_count,
        }
    }
}

/// Item row for templates.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: i32,
    pub name: String,
    pub category_name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub dietary_tags: String,
    pub is_featured: bool,
    pub is_active: bool,
    pub display_order: i32,
}

impl From<&MenuItem> for ItemView {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.as_i32(),
            name: item.name.clone(),
            category_name: item.category_name.clone(),
            description: item.description.clone(),
            price: item.price.amount().to_string(),
            image_url: item.image_url.clone(),
            dietary_tags: item.dietary_tags.join(", "),
            is_featured: item.is_featured,
            is_active: item.is_active,
            display_order: item.display_order,
        }
    }
}

/// Menu management page template.
#[derive(Template)]
#[template(path = "menu/index.html")]
pub struct MenuTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryView>,
    pub items: Vec<ItemView>,
    pub dietary_tags: &'static [&'static str],
}

/// Build the menu router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", get(index))
        .route("/menu/categories", post(create_category))
        .route("/menu/items", post(create_item))
        .route("/menu/items/{id}/delete", post(delete_item))
}

// =============================================================================
// Handlers
// =============================================================================

/// Menu overview.
///
/// GET /menu
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    match load_index(&admin, &state, &session).await {
        Ok(template) => render_page(&template),
        Err(e) => e.into_response(),
    }
}

async fn load_index(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
) -> Result<MenuTemplate, AppError> {
    let menu = &state.repos().menu;
    let (categories, items) = tokio::try_join!(menu.list_categories(), menu.list_items())?;

    Ok(MenuTemplate {
        page: PageContext::load(session, admin, BACK).await?,
        categories: categories.iter().map(CategoryView::from).collect(),
        items: items.iter().map(ItemView::from).collect(),
        dietary_tags: &DIETARY_TAGS,
    })
}

/// Add a category.
///
/// POST /menu/categories
#[instrument(skip(admin, state, session, client, form))]
async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<CategoryForm>,
) -> Response {
    let outcome = async {
        require_csrf(&session, &form.csrf_token).await?;
        let category = form.validate()?;

        state
            .repos()
            .menu
            .create_category(&category)
            .await
            .map_err(|e| conflict_as_validation(e, "A category with this name already exists."))?;

        state
            .activity()
            .record(
                Some(admin.id),
                &client,
                "add_category",
                format!("Added menu category: {}", category.name),
            )
            .await;

        Ok::<_, AppError>("Category added successfully.".to_string())
    }
    .await;

    redirect_with_outcome(&session, BACK, outcome).await
}

/// Add an item, with an optional image.
///
/// POST /menu/items
#[instrument(skip(admin, state, session, client, multipart))]
async fn create_item(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    multipart: Multipart,
) -> Response {
    let outcome = apply_create_item(&admin, &state, &session, &client, multipart).await;
    redirect_with_outcome(&session, BACK, outcome).await
}

async fn apply_create_item(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    client: &ClientInfo,
    multipart: Multipart,
) -> Result<String, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    require_csrf(session, form.text("csrf_token").unwrap_or_default()).await?;

    let mut item = validate_item(&form)?;

    let mut stored = None;
    if let Some(file) = form.take_file("image") {
        match store_image(state, &file).await {
            Ok(accepted) => {
                item.image_url = Some(accepted.relative_path.clone());
                stored = Some(accepted);
            }
            Err(warning) => flash_error(session, warning).await,
        }
    }

    if let Err(e) = state.repos().menu.create_item(&item).await {
        if let Some(accepted) = &stored {
            state.storage().discard(accepted).await;
        }
        return Err(conflict_as_validation(e, "The selected category does not exist."));
    }

    state
        .activity()
        .record(
            Some(admin.id),
            client,
            "add_menu_item",
            format!("Added menu item: {}", item.name),
        )
        .await;

    Ok("Menu item added successfully.".to_string())
}

/// Screen and write an item image, returning the file as stored.
///
/// The error is the warning shown next to the success message.
async fn store_image(state: &AppState, file: &UploadedFile) -> Result<AcceptedFile, String> {
    let accepted = state
        .uploads()
        .validate(file, UploadDirectory::Menu)
        .map_err(|rejection| {
            tracing::info!(file_name = %file.file_name, %rejection, "Menu image rejected");
            format!("Image skipped: {rejection}")
        })?;

    state
        .storage()
        .store(&accepted, &file.bytes)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to store menu image");
            "Image skipped: it could not be saved.".to_string()
        })
}

/// Delete an item.
///
/// POST /menu/items/{id}/delete
#[instrument(skip(admin, state, session, client, form))]
async fn delete_item(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Path(id): Path<i32>,
    Form(form): Form<CsrfForm>,
) -> Response {
    let id = MenuItemId::new(id);
    let outcome = async {
        require_csrf(&session, &form.csrf_token).await?;

        if !state.repos().menu.delete_item(id).await? {
            return Err(AppError::NotFound(format!("Menu item #{id}")));
        }

        state
            .activity()
            .record(
                Some(admin.id),
                &client,
                "delete_menu_item",
                format!("Deleted menu item ID: {id}"),
            )
            .await;

        Ok::<_, AppError>("Menu item deleted successfully.".to_string())
    }
    .await;

    redirect_with_outcome(&session, BACK, outcome).await
}
