//! The enumerated table of editable settings and form validation.
//!
//! Form fields are named `setting_<key>` for scalar values and
//! `setting_<key>[a][b]` for members of structured values. Every submitted
//! `setting_*` field must match a known option and path; anything else is
//! rejected before a single value is written.

use std::collections::BTreeMap;

use bistro_core::Email;

use super::SettingValue;
use super::values::{OpeningHours, SocialLinks};

/// Prefix shared by every settings form field.
pub const FIELD_PREFIX: &str = "setting_";

/// Expected shape of a setting's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// Free text, may be empty.
    Text,
    /// Free text, must not be empty.
    RequiredText,
    /// A valid email address.
    Email,
    /// A phone number with at least seven digits.
    Phone,
    /// An `http`/`https` URL, or empty.
    Url,
    /// JSON-encoded [`OpeningHours`].
    OpeningHours,
    /// JSON-encoded [`SocialLinks`].
    SocialLinks,
    /// Path of an uploaded image; set through a file field, never as text.
    Image,
}

/// One editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingOption {
    pub key: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub kind: SettingKind,
}

impl SettingOption {
    /// Value seeded for a fresh installation.
    #[must_use]
    pub fn default_value(&self) -> String {
        match self.kind {
            SettingKind::OpeningHours => {
                serde_json::to_string(&OpeningHours::default()).unwrap_or_default()
            }
            SettingKind::SocialLinks => {
                serde_json::to_string(&SocialLinks::default()).unwrap_or_default()
            }
            _ => String::new(),
        }
    }
}

const fn option(
    key: &'static str,
    label: &'static str,
    category: &'static str,
    kind: SettingKind,
) -> SettingOption {
    SettingOption {
        key,
        label,
        category,
        kind,
    }
}

/// Every setting the panel knows about.
pub const SETTING_OPTIONS: &[SettingOption] = &[
    option("site_title", "Site Title", "general", SettingKind::RequiredText),
    option("site_tagline", "Site Tagline", "general", SettingKind::Text),
    option("site_logo", "Site Logo", "general", SettingKind::Image),
    option("site_url", "Website URL", "general", SettingKind::Url),
    option("contact_email", "Contact Email", "contact", SettingKind::Email),
    option("contact_phone", "Contact Phone", "contact", SettingKind::Phone),
    option("contact_address", "Address", "contact", SettingKind::RequiredText),
    option("opening_hours", "Opening Hours", "hours", SettingKind::OpeningHours),
    option("social_media", "Social Media", "social", SettingKind::SocialLinks),
    option("meta_description", "Meta Description", "seo", SettingKind::Text),
    option("google_analytics", "Google Analytics ID", "seo", SettingKind::Text),
    option("google_maps_api", "Google Maps API Key", "seo", SettingKind::Text),
];

/// Look up an option by key.
#[must_use]
pub fn find_option(key: &str) -> Option<&'static SettingOption> {
    SETTING_OPTIONS.iter().find(|o| o.key == key)
}

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in a settings submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.summary())]
pub struct SettingsValidationError {
    pub errors: Vec<FieldError>,
}

impl SettingsValidationError {
    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Stored structured values that a partial submission is merged over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredValues {
    pub opening_hours: OpeningHours,
    pub social_links: SocialLinks,
}

impl StructuredValues {
    fn current(&self, kind: SettingKind) -> serde_json::Value {
        let encoded = match kind {
            SettingKind::OpeningHours => serde_json::to_value(&self.opening_hours),
            SettingKind::SocialLinks => serde_json::to_value(&self.social_links),
            _ => Ok(serde_json::Value::Null),
        };
        encoded.unwrap_or(serde_json::Value::Null)
    }
}

/// Validate submitted `(name, value)` pairs against [`SETTING_OPTIONS`].
///
/// Fields without the `setting_` prefix are ignored. Members of a
/// structured value that were not submitted keep their `current` value.
/// Returns the values to write, in table order, or every field error found.
///
/// # Errors
///
/// Returns [`SettingsValidationError`] if any field is unknown or invalid.
pub fn parse_submission(
    fields: &[(String, String)],
    current: &StructuredValues,
) -> Result<Vec<(String, SettingValue)>, SettingsValidationError> {
    let mut errors = Vec::new();
    let mut scalars: BTreeMap<&'static str, String> = BTreeMap::new();
    let mut structured: BTreeMap<&'static str, serde_json::Map<String, serde_json::Value>> =
        BTreeMap::new();

    for (name, raw) in fields {
        let Some(rest) = name.strip_prefix(FIELD_PREFIX) else {
            continue;
        };
        let reject = |message: &str| FieldError {
            field: name.clone(),
            message: message.to_string(),
        };

        let Some((key, path)) = split_field(rest) else {
            errors.push(reject("malformed field name"));
            continue;
        };
        let Some(option) = find_option(key) else {
            errors.push(reject("unknown setting"));
            continue;
        };
        let value = raw.trim();

        match option.kind {
            SettingKind::Image => errors.push(reject("unknown setting")),
            SettingKind::OpeningHours => {
                let known = matches!(path.as_slice(), [group, day]
                    if OpeningHours::FIELDS.iter().any(|(g, d)| g == group && d == day));
                if !known {
                    errors.push(reject("unknown opening hours field"));
                    continue;
                }
                let group = structured
                    .entry(option.key)
                    .or_default()
                    .entry(path[0].to_string())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                if let serde_json::Value::Object(days) = group {
                    days.insert(path[1].to_string(), value.into());
                }
            }
            SettingKind::SocialLinks => {
                let known = matches!(path.as_slice(), [network]
                    if SocialLinks::FIELDS.iter().any(|n| n == network));
                if !known {
                    errors.push(reject("unknown social network"));
                    continue;
                }
                if let Err(message) = check_url(value) {
                    errors.push(reject(message));
                    continue;
                }
                structured
                    .entry(option.key)
                    .or_default()
                    .insert(path[0].to_string(), value.into());
            }
            kind => {
                if !path.is_empty() {
                    errors.push(reject("unknown setting"));
                    continue;
                }
                if let Err(message) = check_scalar(kind, value) {
                    errors.push(reject(message));
                    continue;
                }
                scalars.insert(option.key, value.to_string());
            }
        }
    }

    if !errors.is_empty() {
        return Err(SettingsValidationError { errors });
    }

    let mut values = Vec::new();
    for option in SETTING_OPTIONS {
        if let Some(value) = scalars.remove(option.key) {
            values.push((option.key.to_string(), SettingValue::Text(value)));
        } else if let Some(map) = structured.remove(option.key) {
            values.push((
                option.key.to_string(),
                complete_structured(option.kind, map, current),
            ));
        }
    }
    Ok(values)
}

/// Lay a partial submission over the stored value of the same setting.
fn complete_structured(
    kind: SettingKind,
    map: serde_json::Map<String, serde_json::Value>,
    current: &StructuredValues,
) -> SettingValue {
    let mut merged = current.current(kind);
    merge_json(&mut merged, serde_json::Value::Object(map));
    let completed = match kind {
        SettingKind::OpeningHours => {
            serde_json::from_value::<OpeningHours>(merged.clone()).and_then(serde_json::to_value)
        }
        SettingKind::SocialLinks => {
            serde_json::from_value::<SocialLinks>(merged.clone()).and_then(serde_json::to_value)
        }
        _ => Ok(merged.clone()),
    };
    SettingValue::Json(completed.unwrap_or(merged))
}

/// Recursively overwrite `base` with the members present in `patch`.
fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Split `key[a][b]` into `("key", ["a", "b"])`.
fn split_field(rest: &str) -> Option<(&str, Vec<&str>)> {
    let Some(open) = rest.find('[') else {
        return (!rest.is_empty()).then_some((rest, Vec::new()));
    };
    let (key, mut tail) = rest.split_at(open);
    if key.is_empty() {
        return None;
    }
    let mut path = Vec::new();
    while !tail.is_empty() {
        let inner = tail.strip_prefix('[')?;
        let close = inner.find(']')?;
        let segment = &inner[..close];
        if segment.is_empty() {
            return None;
        }
        path.push(segment);
        tail = &inner[close + 1..];
    }
    Some((key, path))
}

fn check_scalar(kind: SettingKind, value: &str) -> Result<(), &'static str> {
    match kind {
        SettingKind::RequiredText if value.is_empty() => Err("is required"),
        SettingKind::Email => Email::parse(value)
            .map(|_| ())
            .map_err(|_| "must be a valid email address"),
        SettingKind::Phone => check_phone(value),
        SettingKind::Url => check_url(value),
        _ => Ok(()),
    }
}

fn check_phone(value: &str) -> Result<(), &'static str> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || " +-().".contains(c));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !allowed || digits < 7 {
        return Err("must be a phone number");
    }
    Ok(())
}

fn check_url(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err("must be an http or https URL"),
    }
}
