//! External identity types

use serde::{Deserialize, Serialize};

use super::user::AuthProvider;

/// Profile asserted by an identity provider after verification.
///
/// Never persisted directly; the account resolver maps it onto a
/// [`super::LocalUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub provider: AuthProvider,
    pub provider_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
}

impl ExternalIdentity {
    /// Name to store locally, falling back to the email local part.
    #[must_use]
    pub fn name_or_email(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.email.split('@').next().unwrap_or_default().to_string(),
        }
    }

    /// Case-insensitive comparison against a client-claimed address.
    #[must_use]
    pub fn email_matches(&self, claimed: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(claimed.trim())
    }
}

/// Profile a client claims alongside a provider token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "photo")]
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    //! Unit tests for types::identity.
    use super::*;

    fn identity(name: Option<&str>) -> ExternalIdentity {
        ExternalIdentity {
            provider: AuthProvider::Google,
            provider_user_id: "sub-1".into(),
            email: "Grace@Example.com".into(),
            display_name: name.map(str::to_string),
            avatar_url: None,
            email_verified: true,
        }
    }

    /// Assertions:
    /// - Confirms the display name wins when present.
    /// - Confirms blank names fall back to the email local part.
    #[test]
    fn name_falls_back_to_email() {
        assert_eq!(identity(Some("Grace")).name_or_email(), "Grace");
        assert_eq!(identity(Some("  ")).name_or_email(), "Grace");
        assert_eq!(identity(None).name_or_email(), "Grace");
    }

    /// Assertions:
    /// - Confirms email comparison ignores case and surrounding whitespace.
    /// - Confirms a different address does not match.
    #[test]
    fn email_match_is_case_insensitive() {
        let id = identity(None);
        assert!(id.email_matches(" grace@example.COM "));
        assert!(!id.email_matches("mallory@example.com"));
    }

    /// Assertions:
    /// - Confirms the legacy `photo` key is accepted for the picture.
    #[test]
    fn claimed_profile_accepts_photo_alias() {
        let claimed: ClaimedProfile = serde_json::from_str(
            r#"{"id":"1","email":"a@b.c","name":"A","photo":"https://img/x.png"}"#,
        )
        .expect("claimed profile parses");
        assert_eq!(claimed.picture.as_deref(), Some("https://img/x.png"));
    }
}
