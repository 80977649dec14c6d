//! Authentication flows
//!
//! Ports for identity providers and session signing, plus the services that
//! drive a login from authorization URL to issued session.

pub mod account_resolver;
pub mod errors;
pub mod flow;
pub mod ports;
pub mod redirect;
pub mod registry;
pub mod service;
pub mod session_issuer;

pub use account_resolver::AccountResolver;
pub use errors::{AuthFlowError, AuthResult};
pub use flow::{FlowState, FlowTrace};
pub use ports::{
    AuthorizationRequest, IdentityProvider, ProviderTokens, SessionClaims, SessionSigner,
};
pub use redirect::{RedirectPolicy, RedirectTarget};
pub use registry::ProviderRegistry;
pub use service::{
    AuthorizationStart, CallbackOutcome, DirectTokenLogin, MobileCodeExchange, OAuthOrchestrator,
};
pub use session_issuer::{AuthSession, SessionIssuer};
