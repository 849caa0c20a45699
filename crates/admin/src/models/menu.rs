//! Menu categories and items.

use bistro_core::{MenuCategoryId, MenuItemId, Price, Slug};

/// A menu section with its item count.
#[derive(Debug, Clone)]
pub struct MenuCategory {
    pub id: MenuCategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub display_order: i32,
    pub is_active: bool,
    pub item_count: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewMenuCategory {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub display_order: i32,
}

/// A dish, joined with its category name.
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub category_id: MenuCategoryId,
    pub category_name: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub dietary_tags: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub display_order: i32,
}

/// Input for creating a menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub category_id: MenuCategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub dietary_tags: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub display_order: i32,
}
