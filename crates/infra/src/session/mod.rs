//! Local session tokens and PKCE session housekeeping

pub mod jwt;
pub mod sweeper;

pub use jwt::JwtSessionSigner;
pub use sweeper::SessionSweeper;
