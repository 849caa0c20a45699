//! Menu category and item operations.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use bistro_core::{MenuCategoryId, MenuItemId, Price, Slug};

use super::RepositoryError;
use crate::models::{MenuCategory, MenuItem, NewMenuCategory, NewMenuItem};

/// Persistence for menu content.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Categories in display order, each with its item count.
    async fn list_categories(&self) -> Result<Vec<MenuCategory>, RepositoryError>;

    /// Items ordered by category display order, then item display order.
    async fn list_items(&self) -> Result<Vec<MenuItem>, RepositoryError>;

    /// Insert a category.
    async fn create_category(
        &self,
        category: &NewMenuCategory,
    ) -> Result<MenuCategoryId, RepositoryError>;

    /// Insert an item.
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    async fn create_item(&self, item: &NewMenuItem) -> Result<MenuItemId, RepositoryError>;

    /// Delete an item. Returns `false` when no item has this id.
    async fn delete_item(&self, id: MenuItemId) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    display_order: i32,
    is_active: bool,
    item_count: i64,
}

impl From<CategoryRow> for MenuCategory {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: MenuCategoryId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            display_order: row.display_order,
            is_active: row.is_active,
            item_count: row.item_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    category_id: i32,
    category_name: String,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    dietary_tags: Json<Vec<String>>,
    is_featured: bool,
    is_active: bool,
    display_order: i32,
}

impl TryFrom<ItemRow> for MenuItem {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: MenuItemId::new(row.id),
            category_id: MenuCategoryId::new(row.category_id),
            category_name: row.category_name,
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            dietary_tags: row.dietary_tags.0,
            is_featured: row.is_featured,
            is_active: row.is_active,
            display_order: row.display_order,
        })
    }
}

// =============================================================================
// Postgres Repository
// =============================================================================

/// `PostgreSQL` menu repository.
pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn list_categories(&self) -> Result<Vec<MenuCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.name, c.slug, c.description, c.display_order, c.is_active,
                   COUNT(i.id) AS item_count
            FROM bistro.menu_category c
            LEFT JOIN bistro.menu_item i ON i.category_id = c.id
            GROUP BY c.id
            ORDER BY c.display_order, c.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT i.id, i.category_id, c.name AS category_name, i.name, i.description,
                   i.price, i.image_url, i.dietary_tags, i.is_featured, i.is_active,
                   i.display_order
            FROM bistro.menu_item i
            JOIN bistro.menu_category c ON c.id = i.category_id
            ORDER BY c.display_order, c.id, i.display_order, i.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_category(
        &self,
        category: &NewMenuCategory,
    ) -> Result<MenuCategoryId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO bistro.menu_category (name, slug, description, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(&category.description)
        .bind(category.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category"))?;

        Ok(MenuCategoryId::new(id))
    }

    async fn create_item(&self, item: &NewMenuItem) -> Result<MenuItemId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO bistro.menu_item (
                category_id, name, description, price, image_url, dietary_tags,
                is_featured, is_active, display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(item.category_id.as_i32())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(item.image_url.as_deref())
        .bind(Json(&item.dietary_tags))
        .bind(item.is_featured)
        .bind(item.is_active)
        .bind(item.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "menu item"))?;

        Ok(MenuItemId::new(id))
    }

    async fn delete_item(&self, id: MenuItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bistro.menu_item WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
