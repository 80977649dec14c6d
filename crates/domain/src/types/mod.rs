//! Domain types and models

pub mod identity;
pub mod user;

pub use identity::{ClaimedProfile, ExternalIdentity};
pub use user::{AuthProvider, LocalUser, NewLocalUser, PublicUser};
