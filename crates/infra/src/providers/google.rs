//! Google OAuth adapter (authorization code + PKCE S256)

use async_trait::async_trait;
use moneymon_core::auth::errors::{AuthFlowError, AuthResult};
use moneymon_core::auth::ports::{AuthorizationRequest, IdentityProvider, ProviderTokens};
use moneymon_domain::constants::{
    GOOGLE_AUTH_ENDPOINT, GOOGLE_SCOPE, GOOGLE_TOKEN_ENDPOINT, GOOGLE_USERINFO_ENDPOINT,
};
use moneymon_domain::{AuthProvider, ExternalIdentity, ProviderCredentials};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::jwks::{GoogleIdClaims, IdTokenVerifier};
use super::{read_json, require_access_token};
use crate::http::HttpClient;

/// Google endpoints; overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: GOOGLE_AUTH_ENDPOINT.to_string(),
            token: GOOGLE_TOKEN_ENDPOINT.to_string(),
            userinfo: GOOGLE_USERINFO_ENDPOINT.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    verified_email: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

pub struct GoogleProvider {
    credentials: ProviderCredentials,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
    http: HttpClient,
    verifier: IdTokenVerifier,
}

impl GoogleProvider {
    pub fn new(
        credentials: ProviderCredentials,
        redirect_uri: String,
        http: HttpClient,
        verifier: IdTokenVerifier,
    ) -> Self {
        Self { credentials, redirect_uri, endpoints: GoogleEndpoints::default(), http, verifier }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn identity_from_id_token(&self, id_token: &str) -> AuthResult<ExternalIdentity> {
        let claims = self.verifier.verify(id_token, &self.credentials.client_id).await?;
        identity_from_claims(claims)
    }

    async fn identity_from_userinfo(&self, access_token: &str) -> AuthResult<ExternalIdentity> {
        let response = self
            .http
            .send(
                self.http
                    .request(Method::GET, &self.endpoints.userinfo)
                    .bearer_auth(access_token),
            )
            .await?;
        let info: GoogleUserInfo = read_json(AuthProvider::Google, response).await?;

        let email = verified_email(info.email, info.verified_email)?;
        Ok(ExternalIdentity {
            provider: AuthProvider::Google,
            provider_user_id: info.id,
            email,
            display_name: info.name,
            avatar_url: info.picture,
            email_verified: true,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn kind(&self) -> AuthProvider {
        AuthProvider::Google
    }

    fn requires_pkce(&self) -> bool {
        true
    }

    fn default_redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AuthResult<String> {
        let challenge = request.code_challenge.ok_or_else(|| {
            AuthFlowError::InternalFailure("google authorization requires a pkce challenge".into())
        })?;

        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", request.redirect_uri),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", request.state),
                ("code_challenge", challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AuthFlowError::InternalFailure(format!("invalid google endpoint: {e}")))?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<ProviderTokens> {
        let verifier = code_verifier
            .ok_or_else(|| AuthFlowError::InvalidRequest("missing code verifier".into()))?;

        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        let request = self.http.request(Method::POST, &self.endpoints.token).form(&form);
        let response = self.http.send(request).await?;
        let tokens: GoogleTokenResponse = read_json(AuthProvider::Google, response).await?;

        debug!(
            has_id_token = tokens.id_token.is_some(),
            has_access_token = tokens.access_token.is_some(),
            "google code exchanged"
        );
        Ok(ProviderTokens { access_token: tokens.access_token, id_token: tokens.id_token })
    }

    async fn fetch_identity(&self, tokens: &ProviderTokens) -> AuthResult<ExternalIdentity> {
        if let Some(id_token) = tokens.id_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return self.identity_from_id_token(id_token).await;
        }
        let access_token =
            require_access_token(AuthProvider::Google, tokens.access_token.as_deref())?;
        self.identity_from_userinfo(access_token).await
    }
}

fn identity_from_claims(claims: GoogleIdClaims) -> AuthResult<ExternalIdentity> {
    let email = verified_email(claims.email, claims.email_verified)?;
    Ok(ExternalIdentity {
        provider: AuthProvider::Google,
        provider_user_id: claims.sub,
        email,
        display_name: claims.name,
        avatar_url: claims.picture,
        email_verified: true,
    })
}

/// Google marks unverified addresses explicitly; those are refused.
fn verified_email(email: Option<String>, verified: Option<bool>) -> AuthResult<String> {
    let email = email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AuthFlowError::IdentityMismatch("provider did not return an email".into()))?;
    if verified == Some(false) {
        return Err(AuthFlowError::IdentityMismatch("google email is not verified".into()));
    }
    Ok(email)
}
