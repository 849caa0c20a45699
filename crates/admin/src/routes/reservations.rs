//! Reservation route handlers.
//!
//! Any signed-in role may view, add and update reservations.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bistro_core::{Email, ReservationId, ReservationStatus};

use super::{PageContext, redirect_with_outcome, render_page};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_csrf};
use crate::models::reservation::generate_confirmation_code;
use crate::models::{ClientInfo, CurrentAdmin, NewReservation, Reservation, ReservationStats};
use crate::services::MailHeaders;
use crate::state::AppState;

const BACK: &str = "/reservations";

/// Attempts at drawing an unused confirmation code.
const CODE_ATTEMPTS: usize = 3;

// =============================================================================
// Form Types
// =============================================================================

/// Listing filter.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub reservation_id: String,
    #[serde(default)]
    pub status: String,
    pub table_number: Option<String>,
}

/// Manual reservation form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewReservationForm {
    pub csrf_token: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: String,
    pub reservation_time: String,
    pub party_size: String,
    pub special_requests: String,
    pub status: String,
}

impl NewReservationForm {
    /// Validate every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(&self, confirmation_code: String) -> Result<NewReservation, AppError> {
        let mut errors = Vec::new();

        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            errors.push("Customer name is required.".to_string());
        }

        let customer_email = Email::parse(&self.customer_email)
            .map_err(|e| errors.push(format!("Customer email: {e}.")))
            .ok();

        let reservation_date = NaiveDate::parse_from_str(self.reservation_date.trim(), "%Y-%m-%d")
            .map_err(|_| errors.push("Date must be YYYY-MM-DD.".to_string()))
            .ok();

        let reservation_time = parse_time(&self.reservation_time)
            .ok_or_else(|| errors.push("Time must be HH:MM.".to_string()))
            .ok();

        let party_size = match self.party_size.trim().parse::<i32>() {
            Ok(size) if size >= 1 => Some(size),
            _ => {
                errors.push("Party size must be at least 1.".to_string());
                None
            }
        };

        let status = if self.status.trim().is_empty() {
            Some(ReservationStatus::Pending)
        } else {
            self.status
                .trim()
                .parse::<ReservationStatus>()
                .map_err(|e| errors.push(format!("Status: {e}.")))
                .ok()
        };

        match (customer_email, reservation_date, reservation_time, party_size, status) {
            (Some(email), Some(date), Some(time), Some(party_size), Some(status))
                if errors.is_empty() =>
            {
                let special_requests = self.special_requests.trim();
                Ok(NewReservation {
                    confirmation_code,
                    customer_name: customer_name.to_string(),
                    customer_email: email.into_inner(),
                    customer_phone: self.customer_phone.trim().to_string(),
                    reservation_date: date,
                    reservation_time: time,
                    party_size,
                    special_requests: (!special_requests.is_empty())
                        .then(|| special_requests.to_string()),
                    status,
                })
            }
            _ => Err(AppError::Validation(errors.join(" "))),
        }
    }
}

/// Accept `HH:MM` and `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

// =============================================================================
// View Types
// =============================================================================

/// Reservation row for templates.
#[derive(Debug, Clone)]
pub struct ReservationView {
    pub id: i32,
    pub confirmation_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: String,
    pub time: String,
    pub party_size: i32,
    pub special_requests: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub table_number: String,
}

impl From<&Reservation> for ReservationView {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id.as_i32(),
            confirmation_code: r.confirmation_code.clone(),
            customer_name: r.customer_name.clone(),
            customer_email: r.customer_email.clone(),
            customer_phone: r.customer_phone.clone(),
            date: r.reservation_date.format("%b %-d, %Y").to_string(),
            time: r.reservation_time.format("%-I:%M %p").to_string(),
            party_size: r.party_size,
            special_requests: r.special_requests.clone().unwrap_or_default(),
            status: r.status.as_str(),
            status_label: r.status.label(),
            table_number: r.table_number.clone().unwrap_or_default(),
        }
    }
}

/// A status choice for filter links and selects.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub count: i64,
    pub selected: bool,
}

/// Reservations page template.
#[derive(Template)]
#[template(path = "reservations/index.html")]
pub struct ReservationsTemplate {
    pub page: PageContext,
    pub stats: ReservationStats,
    pub statuses: Vec<StatusOption>,
    pub filtered: bool,
    pub reservations: Vec<ReservationView>,
    pub today: Vec<ReservationView>,
}

/// Confirmation email sent to the guest.
#[derive(Template)]
#[template(path = "email/reservation_confirmed.html")]
pub struct ReservationConfirmedEmail {
    pub site_title: String,
    pub site_url: String,
    pub contact_phone: String,
    pub reservation: ReservationView,
}

/// Build the reservations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reservations", get(index).post(create))
        .route("/reservations/status", post(update_status))
}

// =============================================================================
// Handlers
// =============================================================================

/// Reservation listing.
///
/// GET /reservations
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Response {
    match load_index(&admin, &state, &session, query).await {
        Ok(template) => render_page(&template),
        Err(e) => e.into_response(),
    }
}

async fn load_index(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    query: ListQuery,
) -> Result<ReservationsTemplate, AppError> {
    // Unknown filters show everything.
    let filter = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<ReservationStatus>().ok());

    let repo = &state.repos().reservations;
    let today = Local::now().date_naive();
    let (reservations, stats, todays) =
        tokio::try_join!(repo.list(filter), repo.stats(), repo.for_date(today))?;

    let statuses = ReservationStatus::ALL
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            count: stats.count(status),
            selected: filter == Some(status),
        })
        .collect();

    Ok(ReservationsTemplate {
        page: PageContext::load(session, admin, BACK).await?,
        stats,
        statuses,
        filtered: filter.is_some(),
        reservations: reservations.iter().map(ReservationView::from).collect(),
        today: todays.iter().map(ReservationView::from).collect(),
    })
}

/// Change a reservation's status and table.
///
/// POST /reservations/status
#[instrument(skip(admin, state, session, client, form), fields(reservation_id = %form.reservation_id))]
async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<StatusForm>,
) -> Response {
    let outcome = apply_status(&admin, &state, &session, &client, form).await;
    redirect_with_outcome(&session, BACK, outcome).await
}

async fn apply_status(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    client: &ClientInfo,
    form: StatusForm,
) -> Result<String, AppError> {
    require_csrf(session, &form.csrf_token).await?;

    let id = form
        .reservation_id
        .trim()
        .parse::<i32>()
        .map(ReservationId::new)
        .map_err(|_| AppError::Validation("Invalid reservation id.".to_string()))?;
    let status = form
        .status
        .trim()
        .parse::<ReservationStatus>()
        .map_err(|_| AppError::Validation("Unknown reservation status.".to_string()))?;
    let table_number = form
        .table_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let reservation = state
        .repos()
        .reservations
        .update_status(id, status, table_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reservation #{id}")))?;

    state
        .activity()
        .record(
            Some(admin.id),
            client,
            "update_reservation",
            format!("Updated reservation #{id} to {status}"),
        )
        .await;

    if status == ReservationStatus::Confirmed {
        send_confirmation(state, &reservation).await;
    }

    Ok("Reservation updated successfully.".to_string())
}

/// Queue the guest confirmation email. Failures are logged only.
async fn send_confirmation(state: &AppState, reservation: &Reservation) {
    let settings = state.settings();
    let (site_title, site_url, contact_phone) = match tokio::try_join!(
        settings.get("site_title"),
        settings.get("site_url"),
        settings.get("contact_phone")
    ) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping confirmation email: settings unavailable");
            return;
        }
    };

    let email = ReservationConfirmedEmail {
        site_title,
        site_url,
        contact_phone,
        reservation: ReservationView::from(reservation),
    };
    let body = match email.render() {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to render confirmation email");
            return;
        }
    };

    let subject = format!(
        "Your reservation is confirmed ({})",
        reservation.confirmation_code
    );
    let to = reservation.customer_email.clone();
    let mail = state.mail().clone();
    tokio::spawn(async move {
        mail.send(&to, &subject, &body, MailHeaders::default()).await;
    });
}

/// Add a reservation taken by phone or in person.
///
/// POST /reservations
#[instrument(skip(admin, state, session, client, form))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<NewReservationForm>,
) -> Response {
    let outcome = apply_create(&admin, &state, &session, &client, form).await;
    redirect_with_outcome(&session, BACK, outcome).await
}

async fn apply_create(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    client: &ClientInfo,
    form: NewReservationForm,
) -> Result<String, AppError> {
    require_csrf(session, &form.csrf_token).await?;

    let today = Local::now().date_naive();
    let mut attempt = 0;
    let created = loop {
        attempt += 1;
        let new = form.validate(generate_confirmation_code(today))?;
        match state.repos().reservations.create(&new).await {
            Ok(created) => break created,
            Err(RepositoryError::Conflict(_)) if attempt < CODE_ATTEMPTS => {
                tracing::debug!(attempt, "Confirmation code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    };

    state
        .activity()
        .record(
            Some(admin.id),
            client,
            "add_reservation",
            format!("Added manual reservation for {}", created.customer_name),
        )
        .await;

    Ok("Reservation added successfully.".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> NewReservationForm {
        NewReservationForm {
            csrf_token: "t".into(),
            customer_name: " Ada Lovelace ".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: "502-555-0199".into(),
            reservation_date: "2025-03-14".into(),
            reservation_time: "19:30".into(),
            party_size: "4".into(),
            special_requests: String::new(),
            status: "confirmed".into(),
        }
    }

    #[test]
    fn test_valid_form_builds_reservation() {
        let new = valid_form().validate("JF20250314ABC123".into()).unwrap();

        assert_eq!(new.customer_name, "Ada Lovelace");
        assert_eq!(new.party_size, 4);
        assert_eq!(new.status, ReservationStatus::Confirmed);
        assert_eq!(new.reservation_time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert!(new.special_requests.is_none());
    }

    #[test]
    fn test_empty_status_defaults_to_pending() {
        let form = NewReservationForm {
            status: String::new(),
            ..valid_form()
        };
        assert_eq!(
            form.validate("JF".into()).unwrap().status,
            ReservationStatus::Pending
        );
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let form = NewReservationForm {
            customer_name: "  ".into(),
            customer_email: "not-an-email".into(),
            party_size: "0".into(),
            ..valid_form()
        };
        let Err(AppError::Validation(message)) = form.validate("JF".into()) else {
            panic!("expected validation error");
        };

        assert!(message.contains("Customer name is required."));
        assert!(message.contains("Customer email"));
        assert!(message.contains("Party size must be at least 1."));
    }

    #[test]
    fn test_reservation_view_formats_date_and_time() {
        let new = valid_form().validate("JF20250314ABC123".into()).unwrap();
        let reservation = Reservation {
            id: ReservationId::new(7),
            confirmation_code: new.confirmation_code,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            reservation_date: new.reservation_date,
            reservation_time: new.reservation_time,
            party_size: new.party_size,
            special_requests: None,
            status: new.status,
            table_number: Some("12".into()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let view = ReservationView::from(&reservation);
        assert_eq!(view.date, "Mar 14, 2025");
        assert_eq!(view.time, "7:30 PM");
        assert_eq!(view.status_label, "Confirmed");
        assert_eq!(view.table_number, "12");
    }
}
