//! In-memory doubles for core ports
//!
//! Used by unit tests in this crate and, behind the `test-utils` feature, by
//! integration tests in downstream crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use moneymon_domain::{AuthProvider, ExternalIdentity, LocalUser, MoneymonError, Result};
use parking_lot::Mutex;
use url::Url;

use crate::auth::errors::{AuthFlowError, AuthResult};
use crate::auth::ports::{
    AuthorizationRequest, IdentityProvider, ProviderTokens, SessionClaims, SessionSigner,
};
use crate::user::ports::UserRepository;

#[derive(Default)]
struct RepositoryState {
    users: Vec<LocalUser>,
    racing_insert: Option<LocalUser>,
    failure: Option<MoneymonError>,
    delay: Option<Duration>,
}

/// `UserRepository` backed by a vector, enforcing `(email, provider)`
/// uniqueness like the SQL schema does.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl InMemoryUserRepository {
    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.state.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of stored accounts.
    pub fn users(&self) -> Vec<LocalUser> {
        self.state.lock().users.clone()
    }

    /// Seed an account directly.
    pub fn seed(&self, user: LocalUser) {
        self.state.lock().users.push(user);
    }

    /// Make the next lookup miss while `winner` lands concurrently, so the
    /// following insert hits the uniqueness constraint.
    pub fn hide_next_lookup_then_insert(&self, winner: LocalUser) {
        self.state.lock().racing_insert = Some(winner);
    }

    /// Fail every subsequent call with `err`.
    pub fn fail_with(&self, err: MoneymonError) {
        self.state.lock().failure = Some(err);
    }

    /// Delay every subsequent call.
    pub fn delay_by(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    async fn before_call(&self) -> Result<()> {
        let (delay, failure) = {
            let state = self.state.lock();
            (state.delay, state.failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email_and_provider(
        &self,
        email: &str,
        provider: AuthProvider,
    ) -> Result<Option<LocalUser>> {
        self.before_call().await?;
        let mut state = self.state.lock();
        if let Some(winner) = state.racing_insert.take() {
            state.users.push(winner);
            return Ok(None);
        }
        Ok(state.users.iter().find(|u| u.email == email && u.provider == provider).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<LocalUser>> {
        self.before_call().await?;
        Ok(self.state.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: &LocalUser) -> Result<()> {
        self.before_call().await?;
        let mut state = self.state.lock();
        if state.users.iter().any(|u| u.email == user.email && u.provider == user.provider) {
            return Err(MoneymonError::Conflict(format!(
                "users(email, provider) = ({}, {})",
                user.email, user.provider
            )));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &LocalUser) -> Result<()> {
        self.before_call().await?;
        let mut state = self.state.lock();
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| MoneymonError::NotFound(format!("user {}", user.id)))?;
        *slot = user.clone();
        Ok(())
    }
}

/// Arguments of one recorded `exchange_code` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub code: String,
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
}

/// Scriptable [`IdentityProvider`] that records what the orchestrator sent.
pub struct StubIdentityProvider {
    kind: AuthProvider,
    pkce: bool,
    redirect_uri: String,
    exchange_result: Mutex<AuthResult<ProviderTokens>>,
    identity_result: Mutex<AuthResult<ExternalIdentity>>,
    exchanges: Mutex<Vec<ExchangeCall>>,
    identity_calls: AtomicUsize,
}

impl StubIdentityProvider {
    /// Stub that succeeds with `email` as the verified identity.
    pub fn new(kind: AuthProvider, email: &str) -> Self {
        let identity = ExternalIdentity {
            provider: kind,
            provider_user_id: format!("{kind}-user-1"),
            email: email.to_string(),
            display_name: Some("Stub User".into()),
            avatar_url: Some(format!("https://{kind}.example/avatar.png")),
            email_verified: true,
        };
        Self {
            kind,
            pkce: kind == AuthProvider::Google,
            redirect_uri: format!("http://localhost:5000/api/auth/{kind}/callback"),
            exchange_result: Mutex::new(Ok(ProviderTokens {
                access_token: Some(format!("{kind}-access")),
                id_token: None,
            })),
            identity_result: Mutex::new(Ok(identity)),
            exchanges: Mutex::new(Vec::new()),
            identity_calls: AtomicUsize::new(0),
        }
    }

    /// Make the code exchange fail with `err`.
    #[must_use]
    pub fn failing_exchange(self, err: AuthFlowError) -> Self {
        *self.exchange_result.lock() = Err(err);
        self
    }

    /// Make identity verification fail with `err`.
    #[must_use]
    pub fn failing_identity(self, err: AuthFlowError) -> Self {
        *self.identity_result.lock() = Err(err);
        self
    }

    /// Every `exchange_code` call received so far.
    pub fn exchanges(&self) -> Vec<ExchangeCall> {
        self.exchanges.lock().clone()
    }

    /// Number of `fetch_identity` calls received so far.
    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn kind(&self) -> AuthProvider {
        self.kind
    }

    fn requires_pkce(&self) -> bool {
        self.pkce
    }

    fn default_redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AuthResult<String> {
        let mut url = Url::parse(&format!("https://{}.example/authorize", self.kind))
            .map_err(|e| AuthFlowError::InternalFailure(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("state", request.state);
            query.append_pair("redirect_uri", request.redirect_uri);
            if let Some(challenge) = request.code_challenge {
                query.append_pair("code_challenge", challenge);
                query.append_pair("code_challenge_method", "S256");
            }
        }
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<ProviderTokens> {
        self.exchanges.lock().push(ExchangeCall {
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
            code_verifier: code_verifier.map(str::to_string),
        });
        self.exchange_result.lock().clone()
    }

    async fn fetch_identity(&self, _tokens: &ProviderTokens) -> AuthResult<ExternalIdentity> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.identity_result.lock().clone()
    }
}

/// Reversible, unsigned [`SessionSigner`] for tests that do not exercise
/// cryptography. Tokens are opaque handles into an in-memory table.
#[derive(Default)]
pub struct RecordingSigner {
    issued: Mutex<HashMap<String, SessionClaims>>,
    counter: AtomicUsize,
}

impl RecordingSigner {
    /// Claims of every token signed so far.
    pub fn issued(&self) -> Vec<SessionClaims> {
        self.issued.lock().values().cloned().collect()
    }
}

impl SessionSigner for RecordingSigner {
    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = format!("test-token-{n}");
        self.issued.lock().insert(token.clone(), claims.clone());
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<SessionClaims> {
        let claims = self
            .issued
            .lock()
            .get(token)
            .cloned()
            .ok_or_else(|| MoneymonError::Auth("unknown token".into()))?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        if claims.exp <= now {
            return Err(MoneymonError::Auth("token expired".into()));
        }
        Ok(claims)
    }
}
