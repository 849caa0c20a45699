//! URL slugs for menu categories and items.

use serde::{Deserialize, Serialize};

/// A lowercase URL slug derived from a display name.
///
/// Every run of characters outside `[A-Za-z0-9-]` becomes a single `-`,
/// then the result is lowercased.
///
/// ```
/// use bistro_core::Slug;
///
/// assert_eq!(Slug::from_name("Small Plates").as_str(), "small-plates");
/// assert_eq!(Slug::from_name("Soups & Salads").as_str(), "soups-salads");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut in_run = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() || c == '-' {
                slug.push(c.to_ascii_lowercase());
                in_run = false;
            } else if !in_run {
                slug.push('-');
                in_run = true;
            }
        }
        Self(slug)
    }

    /// Wrap an already-stored slug.
    #[must_use]
    pub const fn from_stored(slug: String) -> Self {
        Self(slug)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_collapse_to_single_dash() {
        assert_eq!(Slug::from_name("Steak  --  Frites").as_str(), "steak----frites");
        assert_eq!(Slug::from_name("Crème Brûlée").as_str(), "cr-me-br-l-e");
    }

    #[test]
    fn test_leading_and_trailing_runs_are_kept() {
        assert_eq!(Slug::from_name(" Oysters! ").as_str(), "-oysters-");
    }
}
