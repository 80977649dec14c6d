//! Port interfaces for identity providers and session signing

use std::fmt;

use async_trait::async_trait;
use moneymon_domain::{AuthProvider, ExternalIdentity, Result};
use serde::{Deserialize, Serialize};

use super::errors::AuthResult;

/// Parameters for building a provider authorization URL.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    pub state: &'a str,
    pub redirect_uri: &'a str,
    /// S256 challenge; present only for PKCE providers.
    pub code_challenge: Option<&'a str>,
}

/// Credentials obtained from a provider, or presented directly by a client.
#[derive(Clone, Default)]
pub struct ProviderTokens {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

impl ProviderTokens {
    /// Tokens holding only an access token.
    #[must_use]
    pub fn access(token: impl Into<String>) -> Self {
        Self { access_token: Some(token.into()), id_token: None }
    }
}

impl fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// One external identity provider.
///
/// Implementations own their endpoints, credentials and response shapes; the
/// orchestrator drives them through this interface only.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider tag this adapter serves.
    fn kind(&self) -> AuthProvider;

    /// Whether the authorization request carries a PKCE challenge.
    fn requires_pkce(&self) -> bool;

    /// Web callback registered with the provider.
    fn default_redirect_uri(&self) -> &str;

    /// Build the consent-screen URL.
    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AuthResult<String>;

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must equal the one used in the authorization request.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<ProviderTokens>;

    /// Verify the tokens and return the identity they prove.
    async fn fetch_identity(&self, tokens: &ProviderTokens) -> AuthResult<ExternalIdentity>;
}

/// Claims carried by a local session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub email: String,
    pub provider: AuthProvider,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Signs and verifies local session tokens.
pub trait SessionSigner: Send + Sync {
    /// Sign `claims` into a compact token.
    fn sign(&self, claims: &SessionClaims) -> Result<String>;

    /// Verify signature and expiry, returning the claims.
    fn verify(&self, token: &str) -> Result<SessionClaims>;
}
