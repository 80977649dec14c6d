//! Facebook Login adapter (Graph API v18)

use async_trait::async_trait;
use moneymon_core::auth::errors::{AuthFlowError, AuthResult};
use moneymon_core::auth::ports::{AuthorizationRequest, IdentityProvider, ProviderTokens};
use moneymon_domain::constants::{
    FACEBOOK_AUTH_ENDPOINT, FACEBOOK_PROFILE_ENDPOINT, FACEBOOK_PROFILE_FIELDS, FACEBOOK_SCOPE,
    FACEBOOK_TOKEN_ENDPOINT,
};
use moneymon_domain::{AuthProvider, ExternalIdentity, ProviderCredentials};
use reqwest::Method;
use serde::Deserialize;
use url::Url;

use super::{read_json, require_access_token};
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct FacebookEndpoints {
    pub authorize: String,
    pub token: String,
    pub profile: String,
}

impl Default for FacebookEndpoints {
    fn default() -> Self {
        Self {
            authorize: FACEBOOK_AUTH_ENDPOINT.to_string(),
            token: FACEBOOK_TOKEN_ENDPOINT.to_string(),
            profile: FACEBOOK_PROFILE_ENDPOINT.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct FacebookTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FacebookProfile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<FacebookPicture>,
}

#[derive(Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Deserialize)]
struct FacebookPictureData {
    #[serde(default)]
    url: Option<String>,
}

/// Confidential-client adapter; Facebook flows carry no PKCE challenge.
pub struct FacebookProvider {
    credentials: ProviderCredentials,
    redirect_uri: String,
    endpoints: FacebookEndpoints,
    http: HttpClient,
}

impl FacebookProvider {
    pub fn new(credentials: ProviderCredentials, redirect_uri: String, http: HttpClient) -> Self {
        Self { credentials, redirect_uri, endpoints: FacebookEndpoints::default(), http }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: FacebookEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[async_trait]
impl IdentityProvider for FacebookProvider {
    fn kind(&self) -> AuthProvider {
        AuthProvider::Facebook
    }

    fn requires_pkce(&self) -> bool {
        false
    }

    fn default_redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AuthResult<String> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", request.redirect_uri),
                ("scope", FACEBOOK_SCOPE),
                ("response_type", "code"),
                ("state", request.state),
            ],
        )
        .map_err(|e| AuthFlowError::InternalFailure(format!("invalid facebook endpoint: {e}")))?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        _code_verifier: Option<&str>,
    ) -> AuthResult<ProviderTokens> {
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let request = self.http.request(Method::POST, &self.endpoints.token).form(&form);
        let response = self.http.send(request).await?;
        let tokens: FacebookTokenResponse = read_json(AuthProvider::Facebook, response).await?;

        Ok(ProviderTokens::access(tokens.access_token))
    }

    async fn fetch_identity(&self, tokens: &ProviderTokens) -> AuthResult<ExternalIdentity> {
        let access_token =
            require_access_token(AuthProvider::Facebook, tokens.access_token.as_deref())?;

        let request = self
            .http
            .request(Method::GET, &self.endpoints.profile)
            .query(&[("fields", FACEBOOK_PROFILE_FIELDS), ("access_token", access_token)]);
        let response = self.http.send(request).await?;
        let profile: FacebookProfile = read_json(AuthProvider::Facebook, response).await?;

        let email = profile.email.filter(|e| !e.trim().is_empty()).ok_or_else(|| {
            AuthFlowError::IdentityMismatch("provider did not return an email".into())
        })?;

        // Graph only returns confirmed addresses.
        Ok(ExternalIdentity {
            provider: AuthProvider::Facebook,
            provider_user_id: profile.id,
            email,
            display_name: profile.name,
            avatar_url: profile.picture.and_then(|p| p.data.url),
            email_verified: true,
        })
    }
}
