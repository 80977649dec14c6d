//! Local session issuance

use std::sync::Arc;
use std::time::Duration;

use moneymon_common::time::{Clock, SystemClock};
use moneymon_domain::{LocalUser, MoneymonError, PublicUser};
use serde::Serialize;

use super::errors::{AuthFlowError, AuthResult};
use super::ports::{SessionClaims, SessionSigner};

/// Signed session token plus the user it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Issues and checks session tokens for resolved accounts.
pub struct SessionIssuer {
    signer: Arc<dyn SessionSigner>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(signer: Arc<dyn SessionSigner>, ttl: Duration) -> Self {
        Self::with_clock(signer, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        signer: Arc<dyn SessionSigner>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { signer, clock, ttl }
    }

    /// Sign a session for `user` valid for the configured TTL.
    ///
    /// # Errors
    /// Returns `InternalFailure` if signing fails.
    pub fn issue(&self, user: &LocalUser) -> AuthResult<AuthSession> {
        let iat = self.clock.unix_seconds();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            provider: user.provider,
            iat,
            exp: iat.saturating_add(ttl),
        };
        let token = self
            .signer
            .sign(&claims)
            .map_err(|e| AuthFlowError::InternalFailure(format!("session signing failed: {e}")))?;
        Ok(AuthSession { token, user: PublicUser::from(user) })
    }

    /// Verify a bearer token.
    ///
    /// # Errors
    /// Returns `IdentityMismatch` for bad signatures and expired tokens.
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        self.signer.verify(token).map_err(|err| match err {
            MoneymonError::Auth(msg) | MoneymonError::Security(msg) => {
                AuthFlowError::IdentityMismatch(msg)
            }
            other => AuthFlowError::InternalFailure(other.to_string()),
        })
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}
