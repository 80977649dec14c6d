//! In-memory PKCE session store
//!
//! Maps an authorization `state` to the pending flow it correlates. Entries
//! are single-use: [`PkceSessionStore::take`] removes the entry atomically, so
//! two callbacks racing on one `state` see exactly one winner. Expired
//! entries are never returned, whether or not the sweep has run yet.
//!
//! The store is process-local and starts empty; flows in flight across a
//! restart are lost and must be restarted by the client.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::time::{Clock, SystemClock};

/// Flow data remembered between authorization-URL issuance and callback.
#[derive(Clone)]
pub struct PendingSession {
    /// Provider tag (`"google"`, `"facebook"`, `"discord"`).
    pub provider: String,
    /// PKCE verifier; `None` for confidential-client flows.
    pub code_verifier: Option<String>,
    /// Exact `redirect_uri` sent in the authorization request.
    pub redirect_uri: String,
    pub created_at: Instant,
}

impl fmt::Debug for PendingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSession")
            .field("provider", &self.provider)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Concurrency-safe, TTL-bounded map from `state` to [`PendingSession`].
pub struct PkceSessionStore {
    entries: DashMap<String, PendingSession>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PkceSessionStore {
    /// Create a store backed by the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a store with an injected clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), ttl, clock }
    }

    /// Insert or overwrite the session for `state`, stamped with the current
    /// time.
    pub fn put(
        &self,
        state: impl Into<String>,
        provider: impl Into<String>,
        code_verifier: Option<String>,
        redirect_uri: impl Into<String>,
    ) {
        let session = PendingSession {
            provider: provider.into(),
            code_verifier,
            redirect_uri: redirect_uri.into(),
            created_at: self.clock.now(),
        };
        self.entries.insert(state.into(), session);
    }

    /// Remove and return the session for `state`.
    ///
    /// Returns `None` when the state was never issued, was already taken, or
    /// has outlived the TTL. Callers must not distinguish these cases.
    pub fn take(&self, state: &str) -> Option<PendingSession> {
        let (_, session) = self.entries.remove(state)?;
        if self.is_expired(&session, self.clock.now()) {
            debug!(provider = %session.provider, "discarded expired pkce session");
            return None;
        }
        Some(session)
    }

    /// Delete every entry older than the TTL and return how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        self.entries.retain(|_, session| {
            let keep = !self.is_expired(session, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of live or not-yet-swept entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, session: &PendingSession, now: Instant) -> bool {
        now.saturating_duration_since(session.created_at) > self.ttl
    }
}

impl fmt::Debug for PkceSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceSessionStore")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
