//! Google ID token verification against a cached JWKS
//!
//! Signing keys are cached by `kid` with a TTL. A token signed with an
//! unknown `kid` triggers exactly one JWKS refresh before it is rejected.
//! Every failure, including an unreachable JWKS endpoint, is reported as
//! `IdentityMismatch`.

use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use moneymon_core::auth::errors::{AuthFlowError, AuthResult};
use moneymon_domain::constants::GOOGLE_ISSUERS;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::HttpClient;

const MAX_CACHED_KEYS: u64 = 32;

/// Claims Google places in an ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// RS256 ID token verifier backed by a TTL cache of JWKS keys.
#[derive(Clone)]
pub struct IdTokenVerifier {
    http: HttpClient,
    jwks_url: String,
    issuers: Vec<String>,
    keys: Cache<String, DecodingKey>,
}

impl IdTokenVerifier {
    pub fn new(http: HttpClient, jwks_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http,
            jwks_url: jwks_url.into(),
            issuers: GOOGLE_ISSUERS.iter().map(|issuer| (*issuer).to_string()).collect(),
            keys: Cache::builder().max_capacity(MAX_CACHED_KEYS).time_to_live(ttl).build(),
        }
    }

    /// Override the accepted issuers.
    #[must_use]
    pub fn with_issuers(mut self, issuers: Vec<String>) -> Self {
        self.issuers = issuers;
        self
    }

    /// Verify signature, audience, issuer and expiry of `token`.
    ///
    /// # Errors
    /// Returns `AuthFlowError::IdentityMismatch` for any failure.
    pub async fn verify(&self, token: &str, audience: &str) -> AuthResult<GoogleIdClaims> {
        let header =
            decode_header(token).map_err(|e| mismatch(format!("malformed id token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(mismatch(format!("unexpected id token algorithm {:?}", header.alg)));
        }
        let kid = header.kid.ok_or_else(|| mismatch("id token has no key id"))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&self.issuers);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = 0;

        decode::<GoogleIdClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| mismatch(format!("id token rejected: {e}")))
    }

    /// Number of signing keys currently cached.
    pub async fn cached_keys(&self) -> u64 {
        self.keys.run_pending_tasks().await;
        self.keys.entry_count()
    }

    async fn key_for(&self, kid: &str) -> AuthResult<DecodingKey> {
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }

        debug!(kid, "signing key not cached, refreshing jwks");
        self.refresh().await?;

        self.keys.get(kid).await.ok_or_else(|| mismatch(format!("unknown signing key '{kid}'")))
    }

    async fn refresh(&self) -> AuthResult<()> {
        let response = self
            .http
            .send(self.http.request(Method::GET, &self.jwks_url))
            .await
            .map_err(|e| {
                warn!(error = %e, "jwks fetch failed");
                mismatch("signing keys unavailable")
            })?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "jwks endpoint returned an error");
            return Err(mismatch("signing keys unavailable"));
        }

        let set: JwkSet =
            response.json().await.map_err(|e| mismatch(format!("malformed jwks: {e}")))?;

        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => self.keys.insert(kid, key).await,
                Err(e) => debug!(kid, error = %e, "skipping unusable jwk"),
            }
        }
        Ok(())
    }
}

fn mismatch(detail: impl Into<String>) -> AuthFlowError {
    AuthFlowError::IdentityMismatch(detail.into())
}
