//! Dashboard summary figures.

use bistro_core::ReservationStatus;

/// Counts shown on the dashboard landing page.
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub total_reservations: i64,
    pub pending_reservations: i64,
    pub active_menu_items: i64,
    pub approved_testimonials: i64,
    /// Only statuses with at least one reservation.
    pub reservations_by_status: Vec<(ReservationStatus, i64)>,
    /// Active item counts per category name, in category display order.
    pub items_by_category: Vec<(String, i64)>,
}
