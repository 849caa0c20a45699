//! Domain models for the admin panel.
//!
//! Validated types built from repository rows and consumed by routes and
//! services.

pub mod activity;
pub mod admin_user;
pub mod dashboard;
pub mod menu;
pub mod reservation;
pub mod session;
pub mod setting;

pub use activity::{ActivityEntry, ClientInfo, NewActivity};
pub use admin_user::{AdminRole, AdminUser, NewAdminUser};
pub use dashboard::DashboardStats;
pub use menu::{MenuCategory, MenuItem, NewMenuCategory, NewMenuItem};
pub use reservation::{NewReservation, Reservation, ReservationStats};
pub use session::{CurrentAdmin, Flash, keys as session_keys};
pub use setting::Setting;
