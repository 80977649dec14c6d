//! OAuth client-side primitives
//!
//! # Module Organization
//!
//! - **[`pkce`]**: RFC 7636 verifier/challenge and `state` generation
//! - **[`session_store`]**: single-use, TTL-bounded map from `state` to the
//!   pending authorization it correlates
//!
//! # Security Features
//!
//! - **PKCE**: Prevents authorization code interception
//! - **State Correlation**: CSRF and replay protection; each `state` is
//!   consumed at most once
//! - **Constant-Time Comparison**: verifier checks do not leak prefix matches

pub mod pkce;
#[cfg(feature = "runtime")]
pub mod session_store;

pub use pkce::{
    constant_time_eq, generate_code_challenge, generate_code_verifier, generate_state,
    verify_code_challenge, PkceChallenge,
};
#[cfg(feature = "runtime")]
pub use session_store::{PendingSession, PkceSessionStore};
