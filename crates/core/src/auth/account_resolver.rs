//! Maps verified external identities onto local accounts
//!
//! Accounts are keyed on `(lowercase email, provider)`. The same address
//! under two providers yields two accounts. Concurrent first logins for one
//! key converge on a single row: the loser of the insert race re-reads the
//! winner's row.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moneymon_common::time::{Clock, SystemClock};
use moneymon_domain::{ExternalIdentity, LocalUser, MoneymonError, NewLocalUser};
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::{AuthFlowError, AuthResult};
use crate::user::ports::UserRepository;

/// Find-or-create over a [`UserRepository`], with every storage call bounded
/// by a timeout.
pub struct AccountResolver {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    storage_timeout: Duration,
}

impl AccountResolver {
    pub fn new(repository: Arc<dyn UserRepository>, storage_timeout: Duration) -> Self {
        Self::with_clock(repository, storage_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<dyn UserRepository>,
        storage_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repository, clock, storage_timeout }
    }

    /// Return the local account for `identity`, creating it on first login.
    ///
    /// `last_login` is set to now on every call.
    ///
    /// # Errors
    /// - `InvalidRequest` when the identity carries no usable email.
    /// - `InternalFailure` on storage errors or timeouts.
    pub async fn resolve(&self, identity: &ExternalIdentity) -> AuthResult<LocalUser> {
        let email = identity.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthFlowError::InvalidRequest("identity has no usable email".into()));
        }

        let existing = self
            .bounded(self.repository.find_by_email_and_provider(&email, identity.provider))
            .await?;
        if let Some(user) = existing {
            return self.touch(user).await;
        }

        let user = NewLocalUser {
            name: identity.name_or_email(),
            email: email.clone(),
            provider: identity.provider,
            picture: identity.avatar_url.clone(),
            is_email_verified: true,
        }
        .into_user(Uuid::now_v7().to_string(), self.clock.unix_seconds());

        match self.timed(self.repository.insert(&user)).await? {
            Ok(()) => {
                info!(user_id = %user.id, provider = %user.provider, "created local account");
                Ok(user)
            }
            Err(MoneymonError::Conflict(_)) => {
                debug!(provider = %identity.provider, "lost account insert race, re-reading");
                let winner = self
                    .bounded(self.repository.find_by_email_and_provider(&email, identity.provider))
                    .await?
                    .ok_or_else(|| {
                        AuthFlowError::InternalFailure("account vanished after conflict".into())
                    })?;
                self.touch(winner).await
            }
            Err(err) => Err(storage_failure(err)),
        }
    }

    /// Look up an account by local id.
    ///
    /// # Errors
    /// Returns `InternalFailure` on storage errors or timeouts.
    pub async fn find_by_id(&self, id: &str) -> AuthResult<Option<LocalUser>> {
        self.bounded(self.repository.find_by_id(id)).await
    }

    async fn touch(&self, mut user: LocalUser) -> AuthResult<LocalUser> {
        let now = self.clock.unix_seconds();
        user.last_login = now;
        user.updated_at = now;
        self.bounded(self.repository.update(&user)).await?;
        Ok(user)
    }

    async fn timed<T>(
        &self,
        call: impl Future<Output = moneymon_domain::Result<T>>,
    ) -> AuthResult<moneymon_domain::Result<T>> {
        tokio::time::timeout(self.storage_timeout, call)
            .await
            .map_err(|_| AuthFlowError::InternalFailure("user storage timed out".into()))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = moneymon_domain::Result<T>>,
    ) -> AuthResult<T> {
        self.timed(call).await?.map_err(storage_failure)
    }
}

fn storage_failure(err: MoneymonError) -> AuthFlowError {
    AuthFlowError::InternalFailure(err.to_string())
}
