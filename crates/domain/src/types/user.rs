//! Local user types
//!
//! Users are keyed by `(email, provider)`: the same address signing in with
//! two different providers yields two distinct records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MoneymonError;

/// Identity source of a local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
    Facebook,
    Discord,
}

impl AuthProvider {
    /// All providers that sign users in through an OAuth flow.
    pub const OAUTH: [Self; 3] = [Self::Google, Self::Facebook, Self::Discord];

    /// Lowercase wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Discord => "discord",
        }
    }

    /// Whether the provider is an external OAuth identity source.
    #[must_use]
    pub const fn is_oauth(self) -> bool {
        !matches!(self, Self::Email)
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = MoneymonError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            "discord" => Ok(Self::Discord),
            other => Err(MoneymonError::InvalidInput(format!("unknown provider: {other}"))),
        }
    }
}

/// User record stored in the local database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: String,
    pub name: String,
    /// Always lowercase.
    pub email: String,
    pub provider: AuthProvider,
    pub picture: Option<String>,
    pub is_email_verified: bool,
    /// Unix seconds.
    pub last_login: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields required to create a new [`LocalUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocalUser {
    pub name: String,
    pub email: String,
    pub provider: AuthProvider,
    pub picture: Option<String>,
    pub is_email_verified: bool,
}

impl NewLocalUser {
    /// Materialize the record with an assigned id; all timestamps are `now`.
    #[must_use]
    pub fn into_user(self, id: String, now: i64) -> LocalUser {
        LocalUser {
            id,
            name: self.name,
            email: self.email,
            provider: self.provider,
            picture: self.picture,
            is_email_verified: self.is_email_verified,
            last_login: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sanitized user projection returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub provider: AuthProvider,
    pub is_email_verified: bool,
}

impl From<&LocalUser> for PublicUser {
    fn from(user: &LocalUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
            provider: user.provider,
            is_email_verified: user.is_email_verified,
        }
    }
}
