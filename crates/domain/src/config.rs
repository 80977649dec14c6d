//! Configuration management

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_BIND_ADDR, MIN_JWT_SECRET_LEN, PKCE_SESSION_TTL_SECS, PKCE_SWEEP_INTERVAL_SECS,
    PROVIDER_HTTP_TIMEOUT_SECS, SESSION_TOKEN_TTL_SECS, STORAGE_TIMEOUT_SECS,
};
use crate::errors::{MoneymonError, Result};
use crate::types::AuthProvider;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub pkce: PkceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// HTTP server and redirect configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Public base URL of this backend; callback URIs hang off it.
    pub backend_base_url: String,
    /// Web frontend origin that receives success/error redirects.
    pub frontend_url: String,
    /// Accepted prefixes for mobile deep-link redirect URIs. Empty disables
    /// mobile redirects.
    #[serde(default)]
    pub allowed_mobile_redirects: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Local session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// In-memory PKCE session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceConfig {
    pub session_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for PkceConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: PKCE_SESSION_TTL_SECS,
            sweep_interval_seconds: PKCE_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Outbound call bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub storage_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: PROVIDER_HTTP_TIMEOUT_SECS,
            storage_timeout_seconds: STORAGE_TIMEOUT_SECS,
        }
    }
}

/// Client credentials issued by an identity provider
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Per-provider credentials; a provider is enabled when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google: Option<ProviderCredentials>,
    #[serde(default)]
    pub facebook: Option<ProviderCredentials>,
    #[serde(default)]
    pub discord: Option<ProviderCredentials>,
}

impl ProvidersConfig {
    /// Credentials for `provider`, if configured.
    #[must_use]
    pub fn credentials(&self, provider: AuthProvider) -> Option<&ProviderCredentials> {
        match provider {
            AuthProvider::Google => self.google.as_ref(),
            AuthProvider::Facebook => self.facebook.as_ref(),
            AuthProvider::Discord => self.discord.as_ref(),
            AuthProvider::Email => None,
        }
    }
}

impl Config {
    /// Web callback URI registered with `provider`.
    #[must_use]
    pub fn callback_uri(&self, provider: AuthProvider) -> String {
        format!(
            "{}/api/auth/{}/callback",
            self.server.backend_base_url.trim_end_matches('/'),
            provider.as_str()
        )
    }

    /// Session token lifetime.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_seconds)
    }

    /// Reject configurations the server cannot run safely with.
    ///
    /// # Errors
    /// Returns `MoneymonError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.session.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(MoneymonError::Config(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }
        if self.session.ttl_seconds == 0 {
            return Err(MoneymonError::Config("session ttl must be positive".into()));
        }

        for (name, value) in [
            ("backend_base_url", &self.server.backend_base_url),
            ("frontend_url", &self.server.frontend_url),
        ] {
            Url::parse(value)
                .map_err(|e| MoneymonError::Config(format!("invalid {name} '{value}': {e}")))?;
        }

        if !(1..=30).contains(&self.http.timeout_seconds) {
            return Err(MoneymonError::Config(format!(
                "http timeout must be within 1-30 seconds, got {}",
                self.http.timeout_seconds
            )));
        }
        if self.http.storage_timeout_seconds == 0 {
            return Err(MoneymonError::Config("storage timeout must be positive".into()));
        }
        if self.pkce.session_ttl_seconds == 0 || self.pkce.sweep_interval_seconds == 0 {
            return Err(MoneymonError::Config(
                "pkce session ttl and sweep interval must be positive".into(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(MoneymonError::Config("database pool size must be positive".into()));
        }

        for provider in AuthProvider::OAUTH {
            if let Some(creds) = self.providers.credentials(provider) {
                if creds.client_id.trim().is_empty() || creds.client_secret.trim().is_empty() {
                    return Err(MoneymonError::Config(format!(
                        "{provider} credentials are incomplete"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Parse a duration such as `7d`, `12h`, `30m`, `45s` or a bare number of
/// seconds.
///
/// # Errors
/// Returns `MoneymonError::Config` for empty, zero or malformed values.
pub fn parse_duration_spec(raw: &str) -> Result<u64> {
    let value = raw.trim();
    let invalid = || MoneymonError::Config(format!("invalid duration: '{raw}'"));

    let (digits, multiplier) = match value.chars().last() {
        Some('d') => (&value[..value.len() - 1], 86_400),
        Some('h') => (&value[..value.len() - 1], 3_600),
        Some('m') => (&value[..value.len() - 1], 60),
        Some('s') => (&value[..value.len() - 1], 1),
        Some(c) if c.is_ascii_digit() => (value, 1),
        _ => return Err(invalid()),
    };

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }
    amount.checked_mul(multiplier).ok_or_else(invalid)
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

const fn default_pool_size() -> u32 {
    8
}

const fn default_session_ttl() -> u64 {
    SESSION_TOKEN_TTL_SECS
}
