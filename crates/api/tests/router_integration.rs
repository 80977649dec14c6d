//! Integration tests for the HTTP router
//!
//! Requests go through the full axum stack with stub identity providers, a
//! temporary SQLite database and an in-memory session signer.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use moneymon_api::{build_router, AppContext};
use moneymon_common::PkceSessionStore;
use moneymon_core::auth::{
    AccountResolver, OAuthOrchestrator, ProviderRegistry, RedirectPolicy, SessionIssuer,
};
use moneymon_core::testing::{RecordingSigner, StubIdentityProvider};
use moneymon_core::{IdentityProvider, SessionSigner, UserRepository};
use moneymon_domain::{AuthProvider, Config};
use moneymon_infra::{DbManager, SqliteUserRepository};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

const FRONTEND: &str = "http://localhost:3000";
const MOBILE_REDIRECT: &str = "com.moneymon.app:/oauth2redirect";

struct TestApp {
    router: Router,
    google: Arc<StubIdentityProvider>,
    _dir: TempDir,
}

fn test_config(dir: &TempDir) -> Config {
    serde_json::from_value(json!({
        "server": {
            "backend_base_url": "http://localhost:5000",
            "frontend_url": FRONTEND,
            "allowed_mobile_redirects": ["com.moneymon.app:/"]
        },
        "database": { "path": dir.path().join("moneymon.db").to_string_lossy() },
        "session": { "jwt_secret": "router-test-secret-0123456789abcdef" }
    }))
    .expect("config deserializes")
}

fn test_app() -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let config = test_config(&dir);

    let db = Arc::new(DbManager::new(&config.database.path, 2).expect("db manager"));
    db.run_migrations().expect("migrations");

    let google = Arc::new(StubIdentityProvider::new(AuthProvider::Google, "ada@example.com"));
    let facebook = Arc::new(StubIdentityProvider::new(AuthProvider::Facebook, "fb@example.com"));
    let registry = ProviderRegistry::new()
        .with(Arc::clone(&google) as Arc<dyn IdentityProvider>)
        .with(facebook as Arc<dyn IdentityProvider>);

    let repository: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(Arc::clone(&db)));
    let signer: Arc<dyn SessionSigner> = Arc::new(RecordingSigner::default());
    let orchestrator = OAuthOrchestrator::new(
        registry,
        Arc::new(PkceSessionStore::new(Duration::from_secs(600))),
        AccountResolver::new(repository, Duration::from_secs(5)),
        SessionIssuer::new(signer, Duration::from_secs(3600)),
        RedirectPolicy::new(FRONTEND, config.server.allowed_mobile_redirects.clone())
            .expect("redirect policy"),
    );

    let ctx = Arc::new(AppContext::from_parts(config, db, Arc::new(orchestrator)));
    TestApp { router: build_router(ctx), google, _dir: dir }
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.expect("router responds")
}

async fn get(app: &TestApp, uri: &str) -> Response {
    send(app, Request::builder().uri(uri).body(Body::empty()).expect("request")).await
}

async fn post_json(app: &TestApp, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn location(response: &Response) -> Url {
    let raw = response.headers().get(LOCATION).expect("location header").to_str().expect("ascii");
    Url::parse(raw).expect("absolute location")
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

async fn start_flow(app: &TestApp, uri: &str) -> Value {
    let response = get(app, uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    body["data"].clone()
}

/// Validates the authorization URL endpoint.
///
/// Assertions:
/// - Confirms Google returns a PKCE verifier and an S256 challenge.
/// - Confirms Facebook returns no verifier.
#[tokio::test(flavor = "multi_thread")]
async fn authorization_url_per_provider() {
    let app = test_app();

    let google = start_flow(&app, "/api/auth/google/url").await;
    assert!(google["authUrl"].as_str().expect("url").contains("code_challenge_method=S256"));
    assert!(google["state"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(google["codeVerifier"].as_str().is_some());

    let facebook = start_flow(&app, "/api/auth/facebook/url").await;
    assert!(facebook.get("codeVerifier").is_none());
}

/// Assertions:
/// - Confirms an unknown provider is a 400 with the error envelope.
/// - Confirms a disabled provider is rejected the same way.
#[tokio::test(flavor = "multi_thread")]
async fn unknown_or_disabled_provider_is_bad_request() {
    let app = test_app();

    for uri in ["/api/auth/myspace/url", "/api/auth/discord/url"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "invalid_request");
    }
}

/// Validates the browser callback end to end.
///
/// Assertions:
/// - Confirms success redirects to the frontend with a token and user.
/// - Confirms the token authenticates `GET /api/auth/me`.
/// - Confirms a replayed callback redirects to the error page.
#[tokio::test(flavor = "multi_thread")]
async fn web_callback_redirects_and_rejects_replay() {
    let app = test_app();
    let start = start_flow(&app, "/api/auth/google/url").await;
    let state = start["state"].as_str().expect("state");
    let callback = format!("/api/auth/google/callback?code=abc&state={state}");

    let response = get(&app, &callback).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let success = location(&response);
    assert_eq!(success.path(), "/auth/success");
    let token = query_value(&success, "token").expect("token in redirect");
    let user: Value =
        serde_json::from_str(&query_value(&success, "user").expect("user")).expect("user json");
    assert_eq!(user["email"], "ada@example.com");

    let me = send(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["data"]["user"]["email"], "ada@example.com");

    let replay = get(&app, &callback).await;
    assert_eq!(replay.status(), StatusCode::FOUND);
    let error = location(&replay);
    assert_eq!(error.path(), "/auth/error");
    assert_eq!(query_value(&error, "error").as_deref(), Some("invalid_state"));
    assert_eq!(app.google.exchanges().len(), 1);
}

/// Assertions:
/// - Confirms a provider `error` parameter maps to `access_denied`.
/// - Confirms a callback without `state` maps to `invalid_request`.
#[tokio::test(flavor = "multi_thread")]
async fn callback_errors_redirect_with_code() {
    let app = test_app();

    let denied = get(&app, "/api/auth/google/callback?error=access_denied").await;
    assert_eq!(query_value(&location(&denied), "error").as_deref(), Some("access_denied"));

    let missing = get(&app, "/api/auth/google/callback?code=abc").await;
    assert_eq!(query_value(&location(&missing), "error").as_deref(), Some("invalid_request"));
    assert!(app.google.exchanges().is_empty());
}

/// Assertions:
/// - Confirms a query that fails to deserialize still redirects to the
///   error page instead of leaking the extractor message.
#[tokio::test(flavor = "multi_thread")]
async fn malformed_callback_query_redirects() {
    let app = test_app();

    let response = get(&app, "/api/auth/google/callback?code=a&code=b&state=deadbeef").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let error = location(&response);
    assert_eq!(error.path(), "/auth/error");
    assert_eq!(query_value(&error, "error").as_deref(), Some("invalid_request"));
    assert!(app.google.exchanges().is_empty());
}

/// Validates mobile flows through the callback and the token endpoint.
///
/// Assertions:
/// - Confirms a mobile start redirects back to the deep link.
/// - Confirms `POST /api/auth/google/token` redeems a code with the
///   returned verifier.
/// - Confirms a deep link outside the allowlist is rejected.
#[tokio::test(flavor = "multi_thread")]
async fn mobile_redirect_and_token_exchange() {
    let app = test_app();
    let encoded = "com.moneymon.app%3A%2Foauth2redirect";

    let start = start_flow(&app, &format!("/api/auth/google/url?redirectUri={encoded}")).await;
    let state = start["state"].as_str().expect("state");
    let response = get(&app, &format!("/api/auth/google/callback?code=abc&state={state}")).await;
    let deep_link = location(&response);
    assert!(deep_link.as_str().starts_with(MOBILE_REDIRECT));
    assert_eq!(query_value(&deep_link, "success").as_deref(), Some("true"));

    let start = start_flow(&app, &format!("/api/auth/google/url?redirectUri={encoded}")).await;
    let response = post_json(
        &app,
        "/api/auth/google/token",
        json!({
            "code": "mobile-code",
            "codeVerifier": start["codeVerifier"],
            "state": start["state"],
            "redirectUri": MOBILE_REDIRECT
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");

    let rejected =
        get(&app, "/api/auth/google/url?redirectUri=https%3A%2F%2Fevil.example%2F").await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

/// Validates the deprecated direct-token login.
///
/// Assertions:
/// - Confirms matching claims log in and carry `Deprecation: true`.
/// - Confirms a mismatched email is a 401 that still carries the header.
/// - Confirms malformed JSON is a 400 envelope.
#[tokio::test(flavor = "multi_thread")]
async fn deprecated_direct_login() {
    let app = test_app();

    let ok = post_json(
        &app,
        "/api/login/facebook",
        json!({
            "accessToken": "fb-token",
            "user": { "email": "FB@example.com", "photo": "p.png" }
        }),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(ok.headers().get("deprecation").and_then(|v| v.to_str().ok()), Some("true"));

    let mismatch = post_json(
        &app,
        "/api/login/facebook",
        json!({ "accessToken": "fb-token", "user": { "email": "other@example.com" } }),
    )
    .await;
    assert_eq!(mismatch.status(), StatusCode::UNAUTHORIZED);
    assert!(mismatch.headers().contains_key("deprecation"));
    assert_eq!(json_body(mismatch).await["error"], "identity_mismatch");

    let malformed = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/login/facebook")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request"),
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

/// Assertions:
/// - Confirms `/api/auth/me` without a valid bearer token is a 401.
/// - Confirms `/health` reports ok while the database is reachable.
#[tokio::test(flavor = "multi_thread")]
async fn me_requires_token_and_health_reports_ok() {
    let app = test_app();

    let anonymous = get(&app, "/api/auth/me").await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(anonymous).await["error"], "unauthenticated");

    let forged = send(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .header(AUTHORIZATION, "Bearer not-a-token")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let health = get(&app, "/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["status"], "ok");
}
