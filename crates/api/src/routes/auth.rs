//! Login handlers

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, LOCATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use moneymon_core::auth::{AuthorizationStart, DirectTokenLogin, MobileCodeExchange, RedirectTarget};
use moneymon_core::{AuthFlowError, AuthSession};
use moneymon_domain::{AuthProvider, ClaimedProfile, PublicUser};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ok, Envelope};
use crate::context::AppContext;
use crate::error::ApiError;

type Ctx = State<Arc<AppContext>>;

fn parse_provider(raw: &str) -> Result<AuthProvider, ApiError> {
    raw.parse::<AuthProvider>().map_err(ApiError::from)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlParams {
    redirect_uri: Option<String>,
}

/// `GET /api/auth/{provider}/url`
pub async fn authorization_url(
    State(ctx): Ctx,
    Path(provider): Path<String>,
    params: Result<Query<UrlParams>, QueryRejection>,
) -> Result<Json<Envelope<AuthorizationStart>>, ApiError> {
    let provider = parse_provider(&provider)?;
    let Query(params) = params?;
    let start = ctx.orchestrator.start(provider, params.redirect_uri.as_deref())?;
    Ok(ok("authorization url created", start))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangeBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    code_verifier: String,
    state: Option<String>,
    redirect_uri: Option<String>,
}

/// `POST /api/auth/google/token`
pub async fn google_token(
    State(ctx): Ctx,
    body: Result<Json<TokenExchangeBody>, JsonRejection>,
) -> Result<Json<Envelope<AuthSession>>, ApiError> {
    let Json(body) = body?;
    let session = ctx
        .orchestrator
        .exchange_mobile_code(
            AuthProvider::Google,
            MobileCodeExchange {
                code: body.code,
                code_verifier: body.code_verifier,
                state: body.state,
                redirect_uri: body.redirect_uri,
            },
        )
        .await?;
    Ok(ok("login successful", session))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// `GET /api/auth/{provider}/callback`
///
/// Always answers with a redirect: the success page, the mobile deep link,
/// or the frontend error page with a short error code.
pub async fn callback(
    State(ctx): Ctx,
    Path(provider): Path<String>,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let redirects = ctx.orchestrator.redirects();

    let Ok(Query(params)) = params else {
        warn!(provider = %provider, "malformed callback query");
        return found(redirects.error_url("invalid_request"));
    };

    if let Some(error) = params.error.as_deref() {
        warn!(provider = %provider, error, "provider returned an authorization error");
        return found(redirects.error_url("access_denied"));
    }

    let Ok(provider) = provider.parse::<AuthProvider>() else {
        return found(redirects.error_url("invalid_request"));
    };
    let (Some(code), Some(state)) = (params.code.as_deref(), params.state.as_deref()) else {
        return found(redirects.error_url("invalid_request"));
    };

    let result = match ctx.orchestrator.complete_callback(provider, code, state).await {
        Ok(outcome) => {
            let mobile = matches!(outcome.target, RedirectTarget::Mobile(_));
            info!(provider = %provider, mobile, "login completed");
            redirects.success_url(&outcome.target, &outcome.session)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(url) => found(url),
        Err(e) => {
            warn!(provider = %provider, error = %e, kind = e.error_label(), "callback failed");
            found(redirects.error_url(e.error_code()))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectLoginBody {
    access_token: Option<String>,
    id_token: Option<String>,
    user: ClaimedProfile,
}

/// `POST /api/login/{provider}`
///
/// Deprecated direct-token login. Every response carries `Deprecation: true`.
pub async fn direct_login(
    State(ctx): Ctx,
    Path(provider): Path<String>,
    body: Result<Json<DirectLoginBody>, JsonRejection>,
) -> Response {
    let result = async {
        let provider = parse_provider(&provider)?;
        let Json(body) = body?;
        warn!(provider = %provider, "deprecated direct-token login used");
        let session = ctx
            .orchestrator
            .login_with_token(
                provider,
                DirectTokenLogin {
                    access_token: body.access_token,
                    id_token: body.id_token,
                    claimed: body.user,
                },
            )
            .await?;
        Ok::<_, ApiError>(ok("login successful", session))
    }
    .await;

    let mut response = result.into_response();
    response
        .headers_mut()
        .insert(HeaderName::from_static("deprecation"), HeaderValue::from_static("true"));
    response
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    user: PublicUser,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// `GET /api/auth/me`
pub async fn me(
    State(ctx): Ctx,
    headers: HeaderMap,
) -> Result<Json<Envelope<MeResponse>>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthenticated)?;
    let user = ctx.orchestrator.current_user(token).await.map_err(|e| match e {
        AuthFlowError::IdentityMismatch(_) => ApiError::Unauthenticated,
        other => ApiError::Flow(other),
    })?;
    Ok(ok("current user", MeResponse { user }))
}

#[cfg(test)]
mod tests {
    //! Unit tests for routes::auth.
    use super::*;

    /// Assertions:
    /// - Confirms only `Bearer` authorization values yield a token.
    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
