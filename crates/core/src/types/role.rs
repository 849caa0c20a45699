//! Administrative roles.

use serde::{Deserialize, Serialize};

/// Admin role with a total order used for coarse-grained authorization.
///
/// Variants are declared from least to most privileged, so the derived
/// `Ord` gives `Editor < Admin < SuperAdmin`. A permission check is a
/// single comparison: `role >= required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Day-to-day content and reservations. No menu management.
    Editor,
    /// Reservations and menu management.
    Admin,
    /// Everything, including site settings.
    SuperAdmin,
}

impl AdminRole {
    /// All roles, least privileged first.
    pub const ALL: [Self; 3] = [Self::Editor, Self::Admin, Self::SuperAdmin];

    /// Numeric rank (editor = 1, admin = 2, super admin = 3).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Editor => 1,
            Self::Admin => 2,
            Self::SuperAdmin => 3,
        }
    }

    /// Whether this role may perform an action gated at `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }

    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Editor => "Editor",
            Self::Admin => "Admin",
            Self::SuperAdmin => "Super Admin",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editor => write!(f, "editor"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_matches_rank() {
        for a in AdminRole::ALL {
            for b in AdminRole::ALL {
                assert_eq!(a.satisfies(b), a.rank() >= b.rank(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_editor_never_satisfies_super_admin() {
        assert!(!AdminRole::Editor.satisfies(AdminRole::SuperAdmin));
        assert!(!AdminRole::Admin.satisfies(AdminRole::SuperAdmin));
        assert!(AdminRole::SuperAdmin.satisfies(AdminRole::Editor));
    }

    #[test]
    fn test_display_from_str_agree() {
        for role in AdminRole::ALL {
            assert_eq!(role.to_string().parse::<AdminRole>(), Ok(role));
        }
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).ok();
        assert_eq!(json.as_deref(), Some("\"super_admin\""));
    }
}
