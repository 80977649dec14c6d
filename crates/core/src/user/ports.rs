//! Port interfaces for local user persistence
//!
//! These traits define the boundary between the account resolver and the
//! storage adapter that keeps one row per `(email, provider)`.

use async_trait::async_trait;
use moneymon_domain::{AuthProvider, LocalUser, Result};

/// Trait for user persistence and retrieval
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the account for a lowercase email under one provider
    async fn find_by_email_and_provider(
        &self,
        email: &str,
        provider: AuthProvider,
    ) -> Result<Option<LocalUser>>;

    /// Get an account by its local id
    async fn find_by_id(&self, id: &str) -> Result<Option<LocalUser>>;

    /// Insert a new account.
    ///
    /// Fails with `MoneymonError::Conflict` when `(email, provider)` already
    /// exists.
    async fn insert(&self, user: &LocalUser) -> Result<()>;

    /// Persist changed fields of an existing account
    async fn update(&self, user: &LocalUser) -> Result<()>;
}
