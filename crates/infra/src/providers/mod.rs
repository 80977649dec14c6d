//! Identity provider adapters
//!
//! One adapter per provider, each implementing the core
//! [`IdentityProvider`] port. Adapters own their endpoints, credentials and
//! response shapes; endpoints can be overridden so tests can point them at a
//! local stub server.

pub mod discord;
pub mod facebook;
pub mod google;
pub mod jwks;

use std::sync::Arc;
use std::time::Duration;

use moneymon_core::auth::errors::{AuthFlowError, AuthResult};
use moneymon_core::auth::ports::IdentityProvider;
use moneymon_core::ProviderRegistry;
use moneymon_domain::constants::{GOOGLE_JWKS_ENDPOINT, JWKS_CACHE_TTL_SECS};
use moneymon_domain::{AuthProvider, Config};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

pub use discord::{DiscordEndpoints, DiscordProvider};
pub use facebook::{FacebookEndpoints, FacebookProvider};
pub use google::{GoogleEndpoints, GoogleProvider};
pub use jwks::{GoogleIdClaims, IdTokenVerifier};

use crate::http::HttpClient;

const MAX_REJECTION_MESSAGE_LEN: usize = 200;

/// Build the registry of every provider with configured credentials.
pub fn build_registry(config: &Config, http: &HttpClient) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    if let Some(credentials) = config.providers.google.clone() {
        let verifier = IdTokenVerifier::new(
            http.clone(),
            GOOGLE_JWKS_ENDPOINT,
            Duration::from_secs(JWKS_CACHE_TTL_SECS),
        );
        let provider = GoogleProvider::new(
            credentials,
            config.callback_uri(AuthProvider::Google),
            http.clone(),
            verifier,
        );
        registry = registry.with(Arc::new(provider) as Arc<dyn IdentityProvider>);
    }

    if let Some(credentials) = config.providers.facebook.clone() {
        let provider = FacebookProvider::new(
            credentials,
            config.callback_uri(AuthProvider::Facebook),
            http.clone(),
        );
        registry = registry.with(Arc::new(provider) as Arc<dyn IdentityProvider>);
    }

    if let Some(credentials) = config.providers.discord.clone() {
        let provider = DiscordProvider::new(
            credentials,
            config.callback_uri(AuthProvider::Discord),
            http.clone(),
        );
        registry = registry.with(Arc::new(provider) as Arc<dyn IdentityProvider>);
    }

    info!(enabled = ?registry.enabled(), "identity providers registered");
    registry
}

/// Decode a successful provider response, or turn a non-2xx response into
/// `ProviderRejected`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: AuthProvider,
    response: Response,
) -> AuthResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        debug!(%provider, status = status.as_u16(), %message, "provider rejected request");
        return Err(AuthFlowError::ProviderRejected { status: status.as_u16(), message });
    }

    response.json::<T>().await.map_err(|err| {
        AuthFlowError::UpstreamUnavailable(format!("malformed {provider} response: {err}"))
    })
}

/// Pull a human-readable message out of an OAuth error body.
///
/// Handles `{error, error_description}` and Facebook's
/// `{error: {message}}`; anything else falls back to the truncated body.
fn rejection_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        value
            .get("error_description")
            .and_then(Value::as_str)
            .or_else(|| match value.get("error") {
                Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
                Some(Value::String(code)) => Some(code.as_str()),
                _ => None,
            })
            .or_else(|| value.get("message").and_then(Value::as_str))
    });

    let message = from_json.unwrap_or(body).trim();
    if message.is_empty() {
        return "no error details".to_string();
    }
    message.chars().take(MAX_REJECTION_MESSAGE_LEN).collect()
}

/// Access token required by profile-based providers.
pub(crate) fn require_access_token(
    provider: AuthProvider,
    token: Option<&str>,
) -> AuthResult<&str> {
    match token.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthFlowError::InvalidRequest(format!(
            "{provider} login requires an access token"
        ))),
    }
}
