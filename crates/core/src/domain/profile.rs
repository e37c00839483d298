use serde::{Deserialize, Serialize};

const DEFAULT_DISPLAY_NAME: &str = "Partner";
const DEFAULT_ORGANIZATION: &str = "Independent partner";

/// Partner account as returned by the backend. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// What the header/avatar widgets render, with every fallback already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub display_name: String,
    pub initials: String,
    pub organization: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl PartnerProfile {
    /// Full name, else first name, else last name, else the email's local part, else "Partner".
    pub fn display_name(&self) -> String {
        let first = non_blank(&self.first_name);
        let last = non_blank(&self.last_name);
        match (first, last) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.to_string(),
            (None, Some(l)) => l.to_string(),
            (None, None) => non_blank(&self.email)
                .and_then(|e| e.split('@').next())
                .filter(|local| !local.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        }
    }

    pub fn organization(&self) -> String {
        non_blank(&self.organization)
            .unwrap_or(DEFAULT_ORGANIZATION)
            .to_string()
    }

    /// Up to two uppercase initials from the display name.
    pub fn initials(&self) -> String {
        let initials: String = self
            .display_name()
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "P".to_string()
        } else {
            initials
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            display_name: self.display_name(),
            initials: self.initials(),
            organization: self.organization(),
            email: non_blank(&self.email).map(str::to_string),
            avatar_url: non_blank(&self.avatar_url).map(str::to_string),
        }
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_profile_uses_defaults() {
        let summary = PartnerProfile::default().summary();
        assert_eq!(summary.display_name, "Partner");
        assert_eq!(summary.initials, "P");
        assert_eq!(summary.organization, "Independent partner");
        assert_eq!(summary.email, None);
    }

    #[test]
    fn prefers_full_name() {
        let p: PartnerProfile = serde_json::from_value(json!({
            "first_name": "ada",
            "last_name": "Obi",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(p.display_name(), "ada Obi");
        assert_eq!(p.initials(), "AO");
    }

    #[test]
    fn last_name_alone_beats_email() {
        let p = PartnerProfile {
            last_name: Some("Okafor".to_string()),
            email: Some("clinic.admin@example.com".to_string()),
            ..PartnerProfile::default()
        };
        assert_eq!(p.display_name(), "Okafor");
        assert_eq!(p.initials(), "O");
    }

    #[test]
    fn falls_back_to_email_local_part() {
        let p = PartnerProfile {
            first_name: Some("  ".to_string()),
            email: Some("clinic.admin@example.com".to_string()),
            ..PartnerProfile::default()
        };
        assert_eq!(p.display_name(), "clinic.admin");
        assert_eq!(p.initials(), "C");
    }
}
