//! In-memory repositories for tests.
//!
//! One [`MemoryDatabase`] implements every repository trait over plain
//! collections. Failure switches make a table behave as if the database
//! were unreachable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use bistro_core::{
    ActivityLogId, AdminUserId, MenuCategoryId, MenuItemId, ReservationId, ReservationStatus,
};

use super::{
    ActivityLogRepository, AdminUserRepository, DashboardRepository, MenuRepository,
    Repositories, RepositoryError, ReservationRepository, SettingsRepository,
};
use crate::models::{
    ActivityEntry, AdminUser, DashboardStats, MenuCategory, MenuItem, NewActivity, NewAdminUser,
    NewMenuCategory, NewMenuItem, NewReservation, Reservation, ReservationStats, Setting,
};
use crate::services::settings::SETTING_OPTIONS;

#[derive(Default)]
struct MemoryState {
    settings: Vec<Setting>,
    activity: Vec<ActivityEntry>,
    admin_users: Vec<AdminUser>,
    reservations: Vec<Reservation>,
    categories: Vec<MenuCategory>,
    items: Vec<MenuItem>,
    approved_testimonials: i64,
}

/// Shared in-memory tables.
#[derive(Default)]
pub struct MemoryDatabase {
    state: RwLock<MemoryState>,
    activity_unavailable: AtomicBool,
    settings_unavailable: AtomicBool,
}

fn unavailable() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

fn next_id(len: usize) -> i32 {
    i32::try_from(len).map_or(i32::MAX, |n| n + 1)
}

impl MemoryDatabase {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Settings table pre-seeded with every known option's default.
    #[must_use]
    pub fn seeded() -> Arc<Self> {
        let now = Utc::now();
        let settings = SETTING_OPTIONS
            .iter()
            .map(|option| Setting {
                key: option.key.to_string(),
                value: option.default_value(),
                category: option.category.to_string(),
                updated_at: now,
            })
            .collect();

        Arc::new(Self {
            state: RwLock::new(MemoryState {
                settings,
                ..MemoryState::default()
            }),
            ..Self::default()
        })
    }

    /// Every repository backed by this database.
    #[must_use]
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            settings: self.clone(),
            activity: self.clone(),
            admin_users: self.clone(),
            reservations: self.clone(),
            menu: self.clone(),
            dashboard: self.clone(),
        }
    }

    /// Make activity log writes fail.
    pub fn set_activity_unavailable(&self, unavailable: bool) {
        self.activity_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every settings query fail.
    pub fn set_settings_unavailable(&self, unavailable: bool) {
        self.settings_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Activity entries in insertion order.
    pub async fn activity_entries(&self) -> Vec<ActivityEntry> {
        self.state.read().await.activity.clone()
    }

    /// A single reservation by id.
    pub async fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.state
            .read()
            .await
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// All menu items.
    pub async fn menu_items(&self) -> Vec<MenuItem> {
        self.state.read().await.items.clone()
    }

    /// Record an approved testimonial for dashboard counts.
    pub async fn add_approved_testimonial(&self) {
        self.state.write().await.approved_testimonials += 1;
    }

    fn check_settings(&self) -> Result<(), RepositoryError> {
        if self.settings_unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for MemoryDatabase {
    async fn list_all(&self) -> Result<Vec<Setting>, RepositoryError> {
        self.check_settings()?;
        let mut settings = self.state.read().await.settings.clone();
        settings.sort_by(|a, b| (&a.category, &a.key).cmp(&(&b.category, &b.key)));
        Ok(settings)
    }

    async fn update_value(&self, key: &str, value: &str) -> Result<bool, RepositoryError> {
        self.check_settings()?;
        let mut state = self.state.write().await;
        Ok(state
            .settings
            .iter_mut()
            .find(|s| s.key == key)
            .map(|setting| {
                setting.value = value.to_string();
                setting.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn update_many(&self, values: &[(String, String)]) -> Result<usize, RepositoryError> {
        self.check_settings()?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for (key, value) in values {
            if let Some(setting) = state.settings.iter_mut().find(|s| &s.key == key) {
                setting.value.clone_from(value);
                setting.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_if_missing(
        &self,
        key: &str,
        value: &str,
        category: &str,
    ) -> Result<bool, RepositoryError> {
        self.check_settings()?;
        let mut state = self.state.write().await;
        if state.settings.iter().any(|s| s.key == key) {
            return Ok(false);
        }
        state.settings.push(Setting {
            key: key.to_string(),
            value: value.to_string(),
            category: category.to_string(),
            updated_at: Utc::now(),
        });
        Ok(true)
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryDatabase {
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogId, RepositoryError> {
        if self.activity_unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut state = self.state.write().await;
        let actor = entry
            .user_id
            .and_then(|id| state.admin_users.iter().find(|u| u.id == id));
        let id = ActivityLogId::new(next_id(state.activity.len()));
        let stored = ActivityEntry {
            id,
            user_id: entry.user_id,
            username: actor.map(|u| u.username.clone()),
            full_name: actor.map(|u| u.full_name.clone()),
            action: entry.action.clone(),
            description: entry.description.clone(),
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            created_at: Utc::now(),
        };
        state.activity.push(stored);
        Ok(id)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state.activity.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl AdminUserRepository for MemoryDatabase {
    async fn get_by_username(&self, username: &str) -> Result<Option<AdminUser>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .admin_users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let user = state
            .admin_users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.last_login = Some(Utc::now());
        Ok(())
    }

    async fn create(&self, user: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let mut state = self.state.write().await;
        if state
            .admin_users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_string(),
            ));
        }
        let created = AdminUser {
            id: AdminUserId::new(next_id(state.admin_users.len())),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            password_hash: user.password_hash.clone(),
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        };
        state.admin_users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ReservationRepository for MemoryDatabase {
    async fn list(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        let mut list: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            (b.reservation_date, b.reservation_time).cmp(&(a.reservation_date, a.reservation_time))
        });
        Ok(list)
    }

    async fn for_date(&self, day: NaiveDate) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        let mut list: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|r| r.reservation_date == day)
            .cloned()
            .collect();
        list.sort_by_key(|r| r.reservation_time);
        Ok(list)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state.reservations.iter().rev().take(limit).cloned().collect())
    }

    async fn stats(&self) -> Result<ReservationStats, RepositoryError> {
        let state = self.state.read().await;
        Ok(ReservationStats::from_counts(
            state.reservations.iter().map(|r| (r.status, 1)),
        ))
    }

    async fn update_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        table_number: Option<&str>,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|reservation| {
                reservation.status = status;
                reservation.table_number = table_number.map(str::to_string);
                reservation.updated_at = Utc::now();
                reservation.clone()
            }))
    }

    async fn create(&self, reservation: &NewReservation) -> Result<Reservation, RepositoryError> {
        let mut state = self.state.write().await;
        if state
            .reservations
            .iter()
            .any(|r| r.confirmation_code == reservation.confirmation_code)
        {
            return Err(RepositoryError::Conflict(
                "confirmation code already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let created = Reservation {
            id: ReservationId::new(next_id(state.reservations.len())),
            confirmation_code: reservation.confirmation_code.clone(),
            customer_name: reservation.customer_name.clone(),
            customer_email: reservation.customer_email.clone(),
            customer_phone: reservation.customer_phone.clone(),
            reservation_date: reservation.reservation_date,
            reservation_time: reservation.reservation_time,
            party_size: reservation.party_size,
            special_requests: reservation.special_requests.clone(),
            status: reservation.status,
            table_number: None,
            created_at: now,
            updated_at: now,
        };
        state.reservations.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl MenuRepository for MemoryDatabase {
    async fn list_categories(&self) -> Result<Vec<MenuCategory>, RepositoryError> {
        let state = self.state.read().await;
        let mut categories: Vec<MenuCategory> = state
            .categories
            .iter()
            .map(|c| MenuCategory {
                item_count: state
                    .items
                    .iter()
                    .filter(|i| i.category_id == c.id)
                    .count()
                    .try_into()
                    .unwrap_or(i64::MAX),
                ..c.clone()
            })
            .collect();
        categories.sort_by_key(|c| (c.display_order, c.id));
        Ok(categories)
    }

    async fn list_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let state = self.state.read().await;
        let order_of = |id: MenuCategoryId| {
            state
                .categories
                .iter()
                .find(|c| c.id == id)
                .map_or(i32::MAX, |c| c.display_order)
        };
        let mut items = state.items.clone();
        items.sort_by_key(|i| (order_of(i.category_id), i.category_id, i.display_order, i.id));
        Ok(items)
    }

    async fn create_category(
        &self,
        category: &NewMenuCategory,
    ) -> Result<MenuCategoryId, RepositoryError> {
        let mut state = self.state.write().await;
        if state.categories.iter().any(|c| c.slug == category.slug) {
            return Err(RepositoryError::Conflict("category already exists".into()));
        }
        let id = MenuCategoryId::new(next_id(state.categories.len()));
        state.categories.push(MenuCategory {
            id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            display_order: category.display_order,
            is_active: true,
            item_count: 0,
        });
        Ok(id)
    }

    async fn create_item(&self, item: &NewMenuItem) -> Result<MenuItemId, RepositoryError> {
        let mut state = self.state.write().await;
        let category_name = state
            .categories
            .iter()
            .find(|c| c.id == item.category_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| RepositoryError::Conflict("menu item references a missing row".into()))?;
        let id = MenuItemId::new(
            state
                .items
                .iter()
                .map(|i| i.id.as_i32())
                .max()
                .unwrap_or(0)
                .saturating_add(1),
        );
        state.items.push(MenuItem {
            id,
            category_id: item.category_id,
            category_name,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            dietary_tags: item.dietary_tags.clone(),
            is_featured: item.is_featured,
            is_active: item.is_active,
            display_order: item.display_order,
        });
        Ok(id)
    }

    async fn delete_item(&self, id: MenuItemId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        Ok(state.items.len() < before)
    }
}

#[async_trait]
impl DashboardRepository for MemoryDatabase {
    async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let state = self.state.read().await;
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);

        let reservations_by_status = ReservationStatus::ALL
            .into_iter()
            .map(|status| {
                (
                    status,
                    count(state.reservations.iter().filter(|r| r.status == status).count()),
                )
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        let mut categories: Vec<&MenuCategory> = state.categories.iter().collect();
        categories.sort_by_key(|c| (c.display_order, c.id));
        let items_by_category = categories
            .into_iter()
            .map(|c| {
                (
                    c.name.clone(),
                    count(
                        state
                            .items
                            .iter()
                            .filter(|i| i.category_id == c.id && i.is_active)
                            .count(),
                    ),
                )
            })
            .collect();

        Ok(DashboardStats {
            total_reservations: count(state.reservations.len()),
            pending_reservations: count(
                state
                    .reservations
                    .iter()
                    .filter(|r| r.status == ReservationStatus::Pending)
                    .count(),
            ),
            active_menu_items: count(state.items.iter().filter(|i| i.is_active).count()),
            approved_testimonials: state.approved_testimonials,
            reservations_by_status,
            items_by_category,
        })
    }
}
