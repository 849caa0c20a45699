//! Structured setting values stored as JSON text.

use serde::{Deserialize, Serialize};

/// Weekly opening hours shown on the public site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub lunch: LunchHours,
    pub dinner: DinnerHours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunchHours {
    pub mon_fri: String,
}

impl Default for LunchHours {
    fn default() -> Self {
        Self {
            mon_fri: "11:00 AM - 2:30 PM".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DinnerHours {
    pub mon_thu: String,
    pub fri_sat: String,
    pub sun: String,
}

impl Default for DinnerHours {
    fn default() -> Self {
        Self {
            mon_thu: "5:30 PM - 10:00 PM".to_string(),
            fri_sat: "5:30 PM - 11:00 PM".to_string(),
            sun: "5:30 PM - 10:00 PM".to_string(),
        }
    }
}

impl OpeningHours {
    /// Form path segments accepted under `setting_opening_hours`.
    pub const FIELDS: [(&'static str, &'static str); 4] = [
        ("lunch", "mon_fri"),
        ("dinner", "mon_thu"),
        ("dinner", "fri_sat"),
        ("dinner", "sun"),
    ];
}

/// Social profile URLs; empty strings hide the link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub tripadvisor: String,
}

impl SocialLinks {
    /// Form path segments accepted under `setting_social_media`.
    pub const FIELDS: [&'static str; 4] = ["facebook", "instagram", "twitter", "tripadvisor"];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_hours_fill_defaults() {
        let hours: OpeningHours =
            serde_json::from_str(r#"{"lunch":{"mon_fri":"Closed"}}"#).unwrap();

        assert_eq!(hours.lunch.mon_fri, "Closed");
        assert_eq!(hours.dinner, DinnerHours::default());
    }

    #[test]
    fn test_default_hours_serialize_with_sorted_keys() {
        let json = serde_json::to_value(OpeningHours::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"dinner":{"fri_sat":"5:30 PM - 11:00 PM","mon_thu":"5:30 PM - 10:00 PM","sun":"5:30 PM - 10:00 PM"},"lunch":{"mon_fri":"11:00 AM - 2:30 PM"}}"#
        );
    }
}
