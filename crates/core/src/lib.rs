//! # Moneymon Core
//!
//! Login business logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for identity providers, session signing and user
//!   storage
//! - The account resolver and session issuer
//! - The OAuth orchestrator that runs every provider through one flow
//!
//! ## Architecture Principles
//! - Only depends on `moneymon-common` and `moneymon-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;
pub mod user;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::{
    AccountResolver, AuthFlowError, AuthResult, AuthSession, IdentityProvider, OAuthOrchestrator,
    ProviderRegistry, SessionIssuer, SessionSigner,
};
pub use user::ports::UserRepository;
