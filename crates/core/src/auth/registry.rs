//! Enabled identity providers

use std::collections::HashMap;
use std::sync::Arc;

use moneymon_domain::AuthProvider;

use super::errors::{AuthFlowError, AuthResult};
use super::ports::IdentityProvider;

/// Lookup table from provider tag to its adapter.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<AuthProvider, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own tag, replacing any previous adapter.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Adapter for `kind`.
    ///
    /// # Errors
    /// Returns `InvalidRequest` when the provider is not configured.
    pub fn get(&self, kind: AuthProvider) -> AuthResult<Arc<dyn IdentityProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| AuthFlowError::InvalidRequest(format!("{kind} login is not enabled")))
    }

    /// Enabled providers in a stable order.
    #[must_use]
    pub fn enabled(&self) -> Vec<AuthProvider> {
        AuthProvider::OAUTH.into_iter().filter(|p| self.providers.contains_key(p)).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("enabled", &self.enabled()).finish()
    }
}
