//! Site settings route handlers.
//!
//! Super admin only. The form posts as multipart so the logo can ride
//! along with the text fields.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, State},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use super::forms::MultipartForm;
use super::{PageContext, redirect_with_outcome, render_page};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireSuperAdmin, flash_error, require_csrf};
use crate::models::{ClientInfo, CurrentAdmin, Setting};
use crate::services::settings::{
    FIELD_PREFIX, OpeningHours, SettingKind, SocialLinks, StructuredValues, find_option,
    parse_submission,
};
use crate::services::{SettingValue, UploadDirectory};
use crate::state::AppState;

const BACK: &str = "/settings";

/// File field carrying a new site logo.
const LOGO_FIELD: &str = "site_logo";

// =============================================================================
// View Types
// =============================================================================

/// One text input.
#[derive(Debug, Clone)]
pub struct SettingFieldView {
    pub name: String,
    pub label: String,
    pub value: String,
    pub input_type: &'static str,
    pub required: bool,
}

/// Inputs for one settings category.
#[derive(Debug, Clone)]
pub struct SettingGroupView {
    pub category: String,
    pub title: String,
    pub fields: Vec<SettingFieldView>,
}

/// Settings page template.
#[derive(Template)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub page: PageContext,
    pub groups: Vec<SettingGroupView>,
    pub hours: Vec<SettingFieldView>,
    pub social: Vec<SettingFieldView>,
    pub site_logo: String,
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(index).post(update))
}

/// Text input for a stored scalar setting, if it is editable as text.
fn scalar_field(setting: &Setting) -> Option<SettingFieldView> {
    let option = find_option(&setting.key)?;
    let input_type = match option.kind {
        SettingKind::Text | SettingKind::RequiredText => "text",
        SettingKind::Email => "email",
        SettingKind::Phone => "tel",
        SettingKind::Url => "url",
        SettingKind::OpeningHours | SettingKind::SocialLinks | SettingKind::Image => return None,
    };

    Some(SettingFieldView {
        name: format!("{FIELD_PREFIX}{}", option.key),
        label: option.label.to_string(),
        value: setting.value.clone(),
        input_type,
        required: option.kind == SettingKind::RequiredText,
    })
}

fn hours_fields(hours: &OpeningHours) -> Vec<SettingFieldView> {
    OpeningHours::FIELDS
        .iter()
        .map(|(group, day)| {
            let value = match (*group, *day) {
                ("lunch", _) => hours.lunch.mon_fri.clone(),
                (_, "mon_thu") => hours.dinner.mon_thu.clone(),
                (_, "fri_sat") => hours.dinner.fri_sat.clone(),
                _ => hours.dinner.sun.clone(),
            };
            SettingFieldView {
                name: format!("{FIELD_PREFIX}opening_hours[{group}][{day}]"),
                label: format!("{} {}", title_case(group), day_label(day)),
                value,
                input_type: "text",
                required: false,
            }
        })
        .collect()
}

fn social_fields(links: &SocialLinks) -> Vec<SettingFieldView> {
    SocialLinks::FIELDS
        .iter()
        .map(|network| {
            let value = match *network {
                "facebook" => links.facebook.clone(),
                "instagram" => links.instagram.clone(),
                "twitter" => links.twitter.clone(),
                _ => links.tripadvisor.clone(),
            };
            SettingFieldView {
                name: format!("{FIELD_PREFIX}social_media[{network}]"),
                label: title_case(network),
                value,
                input_type: "url",
                required: false,
            }
        })
        .collect()
}

fn day_label(day: &str) -> &'static str {
    match day {
        "mon_fri" => "(Mon - Fri)",
        "mon_thu" => "(Mon - Thu)",
        "fri_sat" => "(Fri - Sat)",
        _ => "(Sun)",
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Settings form.
///
/// GET /settings
#[instrument(skip(admin, state, session))]
async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
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
) -> Result<SettingsTemplate, AppError> {
    let settings = state.settings();
    let (grouped, hours, social, site_logo) = tokio::try_join!(
        settings.grouped(),
        settings.opening_hours(),
        settings.social_links(),
        settings.get(LOGO_FIELD),
    )?;

    let groups = grouped
        .into_iter()
        .filter_map(|(category, rows)| {
            let fields: Vec<_> = rows.iter().filter_map(scalar_field).collect();
            (!fields.is_empty()).then(|| SettingGroupView {
                title: title_case(&category),
                category,
                fields,
            })
        })
        .collect();

    Ok(SettingsTemplate {
        page: PageContext::load(session, admin, BACK).await?,
        groups,
        hours: hours_fields(&hours),
        social: social_fields(&social),
        site_logo,
    })
}

/// Validate and save the whole form.
///
/// POST /settings
#[instrument(skip(admin, state, session, client, multipart))]
async fn update(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    multipart: Multipart,
) -> Response {
    let outcome = apply_update(&admin, &state, &session, &client, multipart).await;
    redirect_with_outcome(&session, BACK, outcome).await
}

async fn apply_update(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    client: &ClientInfo,
    multipart: Multipart,
) -> Result<String, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    require_csrf(session, form.text("csrf_token").unwrap_or_default()).await?;

    let settings = state.settings();
    let (opening_hours, social_links) =
        tokio::try_join!(settings.opening_hours(), settings.social_links())?;
    let current = StructuredValues {
        opening_hours,
        social_links,
    };
    let mut values = parse_submission(form.fields(), &current)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut stored_logo = None;
    if let Some(file) = form.take_file(LOGO_FIELD) {
        match state.uploads().validate(&file, UploadDirectory::Site) {
            Ok(accepted) => match state.storage().store(&accepted, &file.bytes).await {
                Ok(stored) => {
                    values.push((
                        LOGO_FIELD.to_string(),
                        SettingValue::Text(stored.relative_path.clone()),
                    ));
                    stored_logo = Some(stored);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store site logo");
                    flash_error(session, "Logo skipped: it could not be saved.").await;
                }
            },
            Err(rejection) => {
                tracing::info!(file_name = %file.file_name, %rejection, "Site logo rejected");
                flash_error(session, format!("Logo skipped: {rejection}")).await;
            }
        }
    }

    let changed = match settings.set_many(values).await {
        Ok(changed) => changed,
        Err(e) => {
            if let Some(stored) = &stored_logo {
                state.storage().discard(stored).await;
            }
            return Err(e.into());
        }
    };
    tracing::info!(changed, "Settings updated");

    state
        .activity()
        .record(
            Some(admin.id),
            client,
            "update_settings",
            "Updated website settings",
        )
        .await;

    Ok("Settings updated successfully.".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn setting(key: &str, value: &str) -> Setting {
        Setting {
            key: key.to_string(),
            value: value.to_string(),
            category: "contact".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_scalar_field_input_types() {
        let email = scalar_field(&setting("contact_email", "hello@bistro.com")).unwrap();
        assert_eq!(email.name, "setting_contact_email");
        assert_eq!(email.input_type, "email");
        assert_eq!(email.value, "hello@bistro.com");

        let title = scalar_field(&setting("site_title", "Bistro")).unwrap();
        assert!(title.required);

        let website = scalar_field(&setting("site_url", "")).unwrap();
        assert_eq!(website.input_type, "url");
    }

    #[test]
    fn test_structured_and_unknown_settings_have_no_text_input() {
        assert!(scalar_field(&setting("opening_hours", "{}")).is_none());
        assert!(scalar_field(&setting("site_logo", "")).is_none());
        assert!(scalar_field(&setting("legacy_key", "x")).is_none());
    }

    #[test]
    fn test_hours_fields_round_trip_names() {
        let fields = hours_fields(&OpeningHours::default());
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name, "setting_opening_hours[lunch][mon_fri]");
        assert_eq!(fields[0].value, "11:00 AM - 2:30 PM");
        assert_eq!(fields[2].label, "Dinner (Fri - Sat)");
        assert_eq!(fields[2].value, "5:30 PM - 11:00 PM");

        let pairs: Vec<(String, String)> = fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();
        let parsed = parse_submission(&pairs, &StructuredValues::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "opening_hours");
    }

    #[test]
    fn test_social_fields() {
        let links = SocialLinks {
            instagram: "https://instagram.com/bistro".into(),
            ..SocialLinks::default()
        };
        let fields = social_fields(&links);
        assert_eq!(fields[1].name, "setting_social_media[instagram]");
        assert_eq!(fields[1].label, "Instagram");
        assert_eq!(fields[1].value, "https://instagram.com/bistro");
    }
}
