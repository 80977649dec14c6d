//! OAuth orchestration - the one login flow every provider runs through
//!
//! ```text
//! start ──► provider consent ──► complete_callback
//!   │                               │
//!   ├─ state (+ PKCE) generated     ├─ session taken (single use)
//!   └─ pending session stored       ├─ code exchanged
//!                                   ├─ identity verified
//!                                   ├─ account resolved
//!                                   └─ session issued
//! ```
//!
//! Mobile apps that receive the code themselves use `exchange_mobile_code`;
//! clients that already hold a provider token use the deprecated
//! `login_with_token`. All three converge on the same resolve-and-issue tail.

use std::fmt;
use std::sync::Arc;

use moneymon_common::auth::{constant_time_eq, generate_state, PkceChallenge, PkceSessionStore};
use moneymon_domain::{AuthProvider, ClaimedProfile, ExternalIdentity, PublicUser};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::account_resolver::AccountResolver;
use super::errors::{AuthFlowError, AuthResult};
use super::flow::{FlowState, FlowTrace};
use super::ports::{AuthorizationRequest, ProviderTokens};
use super::redirect::{RedirectPolicy, RedirectTarget};
use super::registry::ProviderRegistry;
use super::session_issuer::{AuthSession, SessionIssuer};

/// Authorization URL handed to the client, with the values it needs to
/// finish the flow.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationStart {
    pub auth_url: String,
    pub state: String,
    /// Returned for PKCE providers so a mobile client can redeem the code
    /// itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
}

impl fmt::Debug for AuthorizationStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationStart")
            .field("auth_url", &self.auth_url)
            .field("state", &self.state)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Result of a completed browser callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub session: AuthSession,
    pub target: RedirectTarget,
}

/// Code redemption request from a mobile client.
#[derive(Clone)]
pub struct MobileCodeExchange {
    pub code: String,
    pub code_verifier: String,
    /// When present, the pending session for this state is consumed and its
    /// verifier and redirect URI must match.
    pub state: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Provider credentials presented directly by a client.
#[derive(Clone)]
pub struct DirectTokenLogin {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub claimed: ClaimedProfile,
}

/// Drives login flows over the registered identity providers.
pub struct OAuthOrchestrator {
    providers: ProviderRegistry,
    sessions: Arc<PkceSessionStore>,
    resolver: AccountResolver,
    issuer: SessionIssuer,
    redirects: RedirectPolicy,
}

impl OAuthOrchestrator {
    pub fn new(
        providers: ProviderRegistry,
        sessions: Arc<PkceSessionStore>,
        resolver: AccountResolver,
        issuer: SessionIssuer,
        redirects: RedirectPolicy,
    ) -> Self {
        Self { providers, sessions, resolver, issuer, redirects }
    }

    #[must_use]
    pub const fn redirects(&self) -> &RedirectPolicy {
        &self.redirects
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<PkceSessionStore> {
        &self.sessions
    }

    #[must_use]
    pub fn enabled_providers(&self) -> Vec<AuthProvider> {
        self.providers.enabled()
    }

    /// Begin a flow: generate `state` (and PKCE material for PKCE
    /// providers), remember the pending session and build the consent URL.
    ///
    /// # Errors
    /// - `InvalidRequest` for a disabled provider or a rejected mobile URI.
    /// - `InternalFailure` if secure randomness is unavailable.
    pub fn start(
        &self,
        provider: AuthProvider,
        mobile_redirect: Option<&str>,
    ) -> AuthResult<AuthorizationStart> {
        let adapter = self.providers.get(provider)?;

        let redirect_uri = match mobile_redirect.map(str::trim).filter(|uri| !uri.is_empty()) {
            Some(uri) => {
                if !adapter.requires_pkce() {
                    return Err(AuthFlowError::InvalidRequest(format!(
                        "{provider} does not support mobile redirects"
                    )));
                }
                self.redirects.validate_mobile(uri)?;
                uri.to_string()
            }
            None => adapter.default_redirect_uri().to_string(),
        };

        let (state, code_verifier, code_challenge) = if adapter.requires_pkce() {
            let pkce = PkceChallenge::generate().map_err(AuthFlowError::InternalFailure)?;
            (pkce.state, Some(pkce.code_verifier), Some(pkce.code_challenge))
        } else {
            (generate_state().map_err(AuthFlowError::InternalFailure)?, None, None)
        };

        let auth_url = adapter.authorization_url(&AuthorizationRequest {
            state: &state,
            redirect_uri: &redirect_uri,
            code_challenge: code_challenge.as_deref(),
        })?;

        self.sessions.put(state.clone(), provider.as_str(), code_verifier.clone(), redirect_uri);
        debug!(provider = %provider, flow_state = %FlowState::Started, "authorization url issued");

        Ok(AuthorizationStart { auth_url, state, code_verifier })
    }

    /// Finish a browser flow from the provider's `code` and `state`.
    ///
    /// The pending session is consumed before any provider call, so a
    /// replayed or expired `state` never reaches the provider.
    ///
    /// # Errors
    /// `ReplayOrExpired` for unknown, consumed, expired or cross-provider
    /// states; otherwise whatever the exchange, verification, resolution or
    /// issuance step reports.
    pub async fn complete_callback(
        &self,
        provider: AuthProvider,
        code: &str,
        state: &str,
    ) -> AuthResult<CallbackOutcome> {
        let mut trace = FlowTrace::from_callback(provider);
        let result = self.run_callback(&mut trace, provider, code, state).await;
        Self::finish(&mut trace, result)
    }

    /// Redeem a code obtained by a mobile client with its own verifier.
    ///
    /// # Errors
    /// - `InvalidRequest` for missing fields, non-PKCE providers or a
    ///   redirect URI that disagrees with the stored one.
    /// - `ReplayOrExpired` when a supplied `state` is unknown or its stored
    ///   verifier differs from the presented one.
    pub async fn exchange_mobile_code(
        &self,
        provider: AuthProvider,
        request: MobileCodeExchange,
    ) -> AuthResult<AuthSession> {
        let mut trace = FlowTrace::from_callback(provider);
        let result = self.run_mobile_exchange(&mut trace, provider, request).await;
        Self::finish(&mut trace, result)
    }

    /// Log in with a provider token the client already holds.
    ///
    /// The claimed email must match the verified one; on mismatch no account
    /// is created or touched.
    ///
    /// # Errors
    /// `InvalidRequest` when no credential or email is supplied,
    /// `IdentityMismatch` on verification failure or email mismatch.
    pub async fn login_with_token(
        &self,
        provider: AuthProvider,
        login: DirectTokenLogin,
    ) -> AuthResult<AuthSession> {
        let mut trace = FlowTrace::from_tokens(provider);
        let result = self.run_direct_login(&mut trace, provider, login).await;
        Self::finish(&mut trace, result)
    }

    /// Resolve a bearer session token to its account.
    ///
    /// # Errors
    /// `IdentityMismatch` for invalid or expired tokens and for accounts
    /// that no longer exist.
    pub async fn current_user(&self, token: &str) -> AuthResult<PublicUser> {
        let claims = self.issuer.verify(token)?;
        let user = self
            .resolver
            .find_by_id(&claims.user_id)
            .await?
            .filter(|user| user.provider == claims.provider)
            .ok_or_else(|| AuthFlowError::IdentityMismatch("account no longer exists".into()))?;
        Ok(PublicUser::from(&user))
    }

    async fn run_callback(
        &self,
        trace: &mut FlowTrace,
        provider: AuthProvider,
        code: &str,
        state: &str,
    ) -> AuthResult<CallbackOutcome> {
        if code.trim().is_empty() || state.trim().is_empty() {
            return Err(AuthFlowError::InvalidRequest("missing code or state".into()));
        }
        let adapter = self.providers.get(provider)?;

        let pending = self.sessions.take(state).ok_or(AuthFlowError::ReplayOrExpired)?;
        if pending.provider != provider.as_str() {
            warn!(
                provider = %provider,
                issued_for = %pending.provider,
                "state used across providers"
            );
            return Err(AuthFlowError::ReplayOrExpired);
        }

        let verifier = if adapter.requires_pkce() {
            Some(pending.code_verifier.as_deref().ok_or_else(|| {
                AuthFlowError::InternalFailure("pending session lacks a verifier".into())
            })?)
        } else {
            None
        };

        let tokens = adapter.exchange_code(code, &pending.redirect_uri, verifier).await?;
        trace.advance(FlowState::Exchanged)?;

        let identity = adapter.fetch_identity(&tokens).await?;
        trace.advance(FlowState::Verified)?;

        let session = self.resolve_and_issue(trace, &identity).await?;
        let target = if pending.redirect_uri == adapter.default_redirect_uri() {
            RedirectTarget::Web
        } else {
            RedirectTarget::Mobile(pending.redirect_uri)
        };
        Ok(CallbackOutcome { session, target })
    }

    async fn run_mobile_exchange(
        &self,
        trace: &mut FlowTrace,
        provider: AuthProvider,
        request: MobileCodeExchange,
    ) -> AuthResult<AuthSession> {
        if request.code.trim().is_empty() || request.code_verifier.trim().is_empty() {
            return Err(AuthFlowError::InvalidRequest("missing code or codeVerifier".into()));
        }
        let adapter = self.providers.get(provider)?;
        if !adapter.requires_pkce() {
            return Err(AuthFlowError::InvalidRequest(format!(
                "{provider} does not support mobile code exchange"
            )));
        }

        let redirect_uri = match request.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => {
                let pending = self.sessions.take(state).ok_or(AuthFlowError::ReplayOrExpired)?;
                if pending.provider != provider.as_str() {
                    return Err(AuthFlowError::ReplayOrExpired);
                }
                let stored = pending.code_verifier.as_deref().unwrap_or_default();
                if !constant_time_eq(stored.as_bytes(), request.code_verifier.as_bytes()) {
                    warn!(
                        provider = %provider,
                        "presented verifier does not match pending session"
                    );
                    return Err(AuthFlowError::ReplayOrExpired);
                }
                if let Some(uri) = request.redirect_uri.as_deref() {
                    if uri != pending.redirect_uri {
                        return Err(AuthFlowError::InvalidRequest(
                            "redirectUri does not match the authorization request".into(),
                        ));
                    }
                }
                pending.redirect_uri
            }
            None => match request.redirect_uri {
                Some(uri) if uri != adapter.default_redirect_uri() => {
                    self.redirects.validate_mobile(&uri)?;
                    uri
                }
                Some(uri) => uri,
                None => adapter.default_redirect_uri().to_string(),
            },
        };

        let tokens = adapter
            .exchange_code(&request.code, &redirect_uri, Some(&request.code_verifier))
            .await?;
        trace.advance(FlowState::Exchanged)?;

        let identity = adapter.fetch_identity(&tokens).await?;
        trace.advance(FlowState::Verified)?;

        self.resolve_and_issue(trace, &identity).await
    }

    async fn run_direct_login(
        &self,
        trace: &mut FlowTrace,
        provider: AuthProvider,
        login: DirectTokenLogin,
    ) -> AuthResult<AuthSession> {
        let non_empty = |token: Option<String>| token.filter(|t| !t.trim().is_empty());
        let tokens = ProviderTokens {
            access_token: non_empty(login.access_token),
            id_token: non_empty(login.id_token),
        };
        if tokens.access_token.is_none() && tokens.id_token.is_none() {
            return Err(AuthFlowError::InvalidRequest("accessToken or idToken is required".into()));
        }
        if login.claimed.email.trim().is_empty() {
            return Err(AuthFlowError::InvalidRequest("user.email is required".into()));
        }
        let adapter = self.providers.get(provider)?;

        let identity = adapter.fetch_identity(&tokens).await?;
        if !identity.email_matches(&login.claimed.email) {
            return Err(AuthFlowError::IdentityMismatch("email mismatch".into()));
        }
        trace.advance(FlowState::Verified)?;

        info!(provider = %provider, "deprecated direct-token login used");
        self.resolve_and_issue(trace, &identity).await
    }

    async fn resolve_and_issue(
        &self,
        trace: &mut FlowTrace,
        identity: &ExternalIdentity,
    ) -> AuthResult<AuthSession> {
        let user = self.resolver.resolve(identity).await?;
        trace.advance(FlowState::Resolved)?;

        let session = self.issuer.issue(&user)?;
        trace.advance(FlowState::Issued)?;
        Ok(session)
    }

    fn finish<T>(trace: &mut FlowTrace, result: AuthResult<T>) -> AuthResult<T> {
        match &result {
            Ok(_) => info!(provider = %trace.provider(), "login flow completed"),
            Err(err) => {
                let reached = trace.current();
                trace.fail();
                warn!(
                    provider = %trace.provider(),
                    flow_state = %reached,
                    error = err.error_label(),
                    detail = %err,
                    "login flow failed"
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::service.
    use std::time::Duration;

    use moneymon_common::testing::MockClock;

    use super::*;
    use crate::auth::ports::IdentityProvider;
    use crate::testing::{InMemoryUserRepository, RecordingSigner, StubIdentityProvider};

    struct Harness {
        orchestrator: OAuthOrchestrator,
        google: Arc<StubIdentityProvider>,
        discord: Arc<StubIdentityProvider>,
        repo: InMemoryUserRepository,
        clock: MockClock,
    }

    fn harness_with(google: StubIdentityProvider) -> Harness {
        let clock = MockClock::new();
        let repo = InMemoryUserRepository::default();
        let google = Arc::new(google);
        let discord = Arc::new(StubIdentityProvider::new(AuthProvider::Discord, "ada@example.com"));
        let registry = ProviderRegistry::new().with(google.clone()).with(discord.clone());
        let sessions = Arc::new(PkceSessionStore::with_clock(
            Duration::from_secs(600),
            Arc::new(clock.clone()),
        ));
        let orchestrator = OAuthOrchestrator::new(
            registry,
            sessions,
            AccountResolver::with_clock(
                Arc::new(repo.clone()),
                Duration::from_secs(1),
                Arc::new(clock.clone()),
            ),
            SessionIssuer::new(Arc::new(RecordingSigner::default()), Duration::from_secs(3600)),
            RedirectPolicy::new("https://app.example.com", vec!["moneymon://".into()])
                .expect("policy"),
        );
        Harness { orchestrator, google, discord, repo, clock }
    }

    fn harness() -> Harness {
        harness_with(StubIdentityProvider::new(AuthProvider::Google, "ada@example.com"))
    }

    /// Validates the web Google flow end to end.
    ///
    /// Assertions:
    /// - Confirms the exchange used the stored verifier and web callback.
    /// - Confirms one account exists and the redirect targets the web
    ///   frontend.
    /// - Confirms the session store is empty afterwards.
    #[tokio::test]
    async fn google_web_flow_completes() {
        let h = harness();
        let start = h.orchestrator.start(AuthProvider::Google, None).expect("start");
        let verifier = start.code_verifier.clone().expect("pkce verifier");

        let outcome = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code-1", &start.state)
            .await
            .expect("callback");

        let calls = h.google.exchanges();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].code_verifier.as_deref(), Some(verifier.as_str()));
        assert_eq!(calls[0].redirect_uri, h.google.default_redirect_uri());
        assert_eq!(outcome.target, RedirectTarget::Web);
        assert_eq!(outcome.session.user.email, "ada@example.com");
        assert_eq!(h.repo.len(), 1);
        assert!(h.orchestrator.sessions().is_empty());
    }

    /// Validates replay protection.
    ///
    /// Assertions:
    /// - Confirms a second callback with the same state is `ReplayOrExpired`.
    /// - Confirms the provider saw exactly one exchange.
    #[tokio::test]
    async fn replayed_state_is_rejected_without_provider_call() {
        let h = harness();
        let start = h.orchestrator.start(AuthProvider::Google, None).expect("start");
        h.orchestrator
            .complete_callback(AuthProvider::Google, "code-1", &start.state)
            .await
            .expect("first callback");

        let err = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code-1", &start.state)
            .await
            .expect_err("replay");
        assert_eq!(err, AuthFlowError::ReplayOrExpired);
        assert_eq!(h.google.exchanges().len(), 1);
    }

    /// Assertions:
    /// - Confirms a state older than the TTL is rejected without an exchange.
    #[tokio::test]
    async fn expired_state_is_rejected() {
        let h = harness();
        let start = h.orchestrator.start(AuthProvider::Google, None).expect("start");
        h.clock.advance(Duration::from_secs(601));

        let err = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code", &start.state)
            .await
            .expect_err("expired");
        assert_eq!(err, AuthFlowError::ReplayOrExpired);
        assert!(h.google.exchanges().is_empty());
    }

    /// Assertions:
    /// - Confirms a Discord state cannot complete a Google callback.
    #[tokio::test]
    async fn state_is_bound_to_provider() {
        let h = harness();
        let start = h.orchestrator.start(AuthProvider::Discord, None).expect("start");
        assert!(start.code_verifier.is_none());

        let err = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code", &start.state)
            .await
            .expect_err("cross provider");
        assert_eq!(err, AuthFlowError::ReplayOrExpired);
        assert!(h.google.exchanges().is_empty());
        assert!(h.discord.exchanges().is_empty());
    }

    /// Validates redirect-URI binding for mobile starts.
    ///
    /// Assertions:
    /// - Confirms the exchange reuses the mobile URI verbatim.
    /// - Confirms the callback redirects to the mobile deep link.
    #[tokio::test]
    async fn mobile_redirect_is_bound_to_session() {
        let h = harness();
        let start = h
            .orchestrator
            .start(AuthProvider::Google, Some("moneymon://auth/callback"))
            .expect("start");
        assert!(start.auth_url.contains("redirect_uri=moneymon%3A%2F%2Fauth%2Fcallback"));

        let outcome = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code", &start.state)
            .await
            .expect("callback");
        assert_eq!(h.google.exchanges()[0].redirect_uri, "moneymon://auth/callback");
        assert_eq!(outcome.target, RedirectTarget::Mobile("moneymon://auth/callback".into()));
    }

    /// Assertions:
    /// - Confirms disallowed mobile URIs are rejected before any session is
    ///   stored.
    /// - Confirms non-PKCE providers refuse mobile redirects.
    #[test]
    fn mobile_redirects_are_validated() {
        let h = harness();
        assert!(matches!(
            h.orchestrator.start(AuthProvider::Google, Some("https://evil.example/cb")),
            Err(AuthFlowError::InvalidRequest(_))
        ));
        assert!(matches!(
            h.orchestrator.start(AuthProvider::Discord, Some("moneymon://auth")),
            Err(AuthFlowError::InvalidRequest(_))
        ));
        assert!(h.orchestrator.sessions().is_empty());
    }

    /// Validates the mobile code exchange with a stored state.
    ///
    /// Assertions:
    /// - Confirms a mismatched verifier is `ReplayOrExpired` and consumes the
    ///   state.
    /// - Confirms a matching verifier completes with the stored redirect URI.
    #[tokio::test]
    async fn mobile_exchange_checks_verifier() {
        let h = harness();
        let start = h
            .orchestrator
            .start(AuthProvider::Google, Some("moneymon://auth"))
            .expect("start");

        let bad = MobileCodeExchange {
            code: "code".into(),
            code_verifier: "not-the-verifier".into(),
            state: Some(start.state.clone()),
            redirect_uri: None,
        };
        let err = h
            .orchestrator
            .exchange_mobile_code(AuthProvider::Google, bad)
            .await
            .expect_err("mismatch");
        assert_eq!(err, AuthFlowError::ReplayOrExpired);

        let again =
            h.orchestrator.start(AuthProvider::Google, Some("moneymon://auth")).expect("start");
        let good = MobileCodeExchange {
            code: "code".into(),
            code_verifier: again.code_verifier.clone().expect("verifier"),
            state: Some(again.state.clone()),
            redirect_uri: Some("moneymon://auth".into()),
        };
        let session = h
            .orchestrator
            .exchange_mobile_code(AuthProvider::Google, good)
            .await
            .expect("exchange");
        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(h.google.exchanges().len(), 1);
        assert_eq!(h.google.exchanges()[0].redirect_uri, "moneymon://auth");
    }

    /// Assertions:
    /// - Confirms a stateless mobile exchange defaults to the web callback.
    /// - Confirms a missing verifier is an invalid request.
    #[tokio::test]
    async fn stateless_mobile_exchange() {
        let h = harness();
        let missing = MobileCodeExchange {
            code: "code".into(),
            code_verifier: String::new(),
            state: None,
            redirect_uri: None,
        };
        assert!(matches!(
            h.orchestrator.exchange_mobile_code(AuthProvider::Google, missing).await,
            Err(AuthFlowError::InvalidRequest(_))
        ));

        let request = MobileCodeExchange {
            code: "code".into(),
            code_verifier: "client-held-verifier".into(),
            state: None,
            redirect_uri: None,
        };
        h.orchestrator
            .exchange_mobile_code(AuthProvider::Google, request)
            .await
            .expect("exchange");
        let call = &h.google.exchanges()[0];
        assert_eq!(call.redirect_uri, h.google.default_redirect_uri());
        assert_eq!(call.code_verifier.as_deref(), Some("client-held-verifier"));
    }

    /// Validates email cross-checking on direct-token login.
    ///
    /// Assertions:
    /// - Confirms a mismatched claimed email is `IdentityMismatch`.
    /// - Confirms no account is created on mismatch.
    /// - Confirms a case-different but equal email succeeds.
    #[tokio::test]
    async fn direct_login_cross_checks_email() {
        let h = harness();
        let claimed = |email: &str| ClaimedProfile {
            id: None,
            email: email.into(),
            name: None,
            picture: None,
        };

        let err = h
            .orchestrator
            .login_with_token(
                AuthProvider::Discord,
                DirectTokenLogin {
                    access_token: Some("token".into()),
                    id_token: None,
                    claimed: claimed("mallory@example.com"),
                },
            )
            .await
            .expect_err("mismatch");
        assert!(matches!(err, AuthFlowError::IdentityMismatch(_)));
        assert!(h.repo.is_empty());

        let session = h
            .orchestrator
            .login_with_token(
                AuthProvider::Discord,
                DirectTokenLogin {
                    access_token: Some("token".into()),
                    id_token: None,
                    claimed: claimed("ADA@example.com"),
                },
            )
            .await
            .expect("login");
        assert_eq!(session.user.provider, AuthProvider::Discord);
        assert_eq!(h.repo.len(), 1);
    }

    /// Assertions:
    /// - Confirms direct login without any credential is an invalid request.
    #[tokio::test]
    async fn direct_login_requires_a_credential() {
        let h = harness();
        let err = h
            .orchestrator
            .login_with_token(
                AuthProvider::Google,
                DirectTokenLogin {
                    access_token: Some("  ".into()),
                    id_token: None,
                    claimed: ClaimedProfile {
                        id: None,
                        email: "ada@example.com".into(),
                        name: None,
                        picture: None,
                    },
                },
            )
            .await
            .expect_err("no credential");
        assert!(matches!(err, AuthFlowError::InvalidRequest(_)));
        assert_eq!(h.google.identity_calls(), 0);
    }

    /// Assertions:
    /// - Confirms provider failures propagate unchanged and no account is
    ///   created.
    #[tokio::test]
    async fn provider_rejection_propagates() {
        let h = harness_with(
            StubIdentityProvider::new(AuthProvider::Google, "ada@example.com").failing_exchange(
                AuthFlowError::ProviderRejected { status: 400, message: "invalid_grant".into() },
            ),
        );
        let start = h.orchestrator.start(AuthProvider::Google, None).expect("start");
        let err = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "bad-code", &start.state)
            .await
            .expect_err("rejected");

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "provider_rejected");
        assert!(h.repo.is_empty());
        assert_eq!(h.google.identity_calls(), 0);
    }

    /// Assertions:
    /// - Confirms an issued token resolves back to its account.
    /// - Confirms an unknown token is `IdentityMismatch`.
    #[tokio::test]
    async fn current_user_round_trip() {
        let h = harness();
        let start = h.orchestrator.start(AuthProvider::Google, None).expect("start");
        let outcome = h
            .orchestrator
            .complete_callback(AuthProvider::Google, "code", &start.state)
            .await
            .expect("callback");

        let user = h.orchestrator.current_user(&outcome.session.token).await.expect("me");
        assert_eq!(user, outcome.session.user);

        assert!(matches!(
            h.orchestrator.current_user("forged").await,
            Err(AuthFlowError::IdentityMismatch(_))
        ));
    }
}
