//! Discord OAuth2 adapter

use async_trait::async_trait;
use moneymon_core::auth::errors::{AuthFlowError, AuthResult};
use moneymon_core::auth::ports::{AuthorizationRequest, IdentityProvider, ProviderTokens};
use moneymon_domain::constants::{
    DISCORD_AUTH_ENDPOINT, DISCORD_AVATAR_BASE, DISCORD_PROFILE_ENDPOINT, DISCORD_SCOPE,
    DISCORD_TOKEN_ENDPOINT,
};
use moneymon_domain::{AuthProvider, ExternalIdentity, ProviderCredentials};
use reqwest::Method;
use serde::Deserialize;
use url::Url;

use super::{read_json, require_access_token};
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct DiscordEndpoints {
    pub authorize: String,
    pub token: String,
    pub profile: String,
    pub avatar_base: String,
}

impl Default for DiscordEndpoints {
    fn default() -> Self {
        Self {
            authorize: DISCORD_AUTH_ENDPOINT.to_string(),
            token: DISCORD_TOKEN_ENDPOINT.to_string(),
            profile: DISCORD_PROFILE_ENDPOINT.to_string(),
            avatar_base: DISCORD_AVATAR_BASE.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct DiscordTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    verified: Option<bool>,
    #[serde(default)]
    avatar: Option<String>,
}

pub struct DiscordProvider {
    credentials: ProviderCredentials,
    redirect_uri: String,
    endpoints: DiscordEndpoints,
    http: HttpClient,
}

impl DiscordProvider {
    pub fn new(credentials: ProviderCredentials, redirect_uri: String, http: HttpClient) -> Self {
        Self { credentials, redirect_uri, endpoints: DiscordEndpoints::default(), http }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: DiscordEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn avatar_url(&self, user_id: &str, avatar: Option<&str>) -> Option<String> {
        avatar.filter(|hash| !hash.is_empty()).map(|hash| {
            format!("{}/{user_id}/{hash}.png", self.endpoints.avatar_base.trim_end_matches('/'))
        })
    }
}

#[async_trait]
impl IdentityProvider for DiscordProvider {
    fn kind(&self) -> AuthProvider {
        AuthProvider::Discord
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
                ("response_type", "code"),
                ("scope", DISCORD_SCOPE),
                ("state", request.state),
            ],
        )
        .map_err(|e| AuthFlowError::InternalFailure(format!("invalid discord endpoint: {e}")))?;

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
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let request = self.http.request(Method::POST, &self.endpoints.token).form(&form);
        let response = self.http.send(request).await?;
        let tokens: DiscordTokenResponse = read_json(AuthProvider::Discord, response).await?;

        Ok(ProviderTokens::access(tokens.access_token))
    }

    async fn fetch_identity(&self, tokens: &ProviderTokens) -> AuthResult<ExternalIdentity> {
        let access_token =
            require_access_token(AuthProvider::Discord, tokens.access_token.as_deref())?;

        let response = self
            .http
            .send(self.http.request(Method::GET, &self.endpoints.profile).bearer_auth(access_token))
            .await?;
        let user: DiscordUser = read_json(AuthProvider::Discord, response).await?;

        let email = user.email.as_deref().filter(|e| !e.trim().is_empty()).ok_or_else(|| {
            AuthFlowError::IdentityMismatch("provider did not return an email".into())
        })?;
        if user.verified != Some(true) {
            return Err(AuthFlowError::IdentityMismatch("discord email is not verified".into()));
        }

        Ok(ExternalIdentity {
            provider: AuthProvider::Discord,
            email: email.to_string(),
            avatar_url: self.avatar_url(&user.id, user.avatar.as_deref()),
            display_name: user.global_name.or(Some(user.username)),
            provider_user_id: user.id,
            email_verified: true,
        })
    }
}
