//! Failure taxonomy for login flows
//!
//! Every flow failure maps to exactly one [`AuthFlowError`] variant. The
//! variant decides the HTTP status, the short code placed in error
//! redirects, and the message clients are allowed to see. Detailed causes go
//! to the log, never to the client.

use moneymon_domain::MoneymonError;
use thiserror::Error;

/// Result alias for flow operations.
pub type AuthResult<T> = std::result::Result<T, AuthFlowError>;

/// Errors surfaced by the OAuth orchestrator and identity providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFlowError {
    /// Required parameter missing or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown, consumed or expired `state`. Deliberately carries no detail.
    #[error("invalid or expired session")]
    ReplayOrExpired,

    /// Provider answered the code exchange or profile call with an error.
    #[error("provider rejected request (status {status}): {message}")]
    ProviderRejected { status: u16, message: String },

    /// Token failed verification or the claimed identity disagrees with the
    /// verified one.
    #[error("identity verification failed: {0}")]
    IdentityMismatch(String),

    /// Network failure or timeout talking to a provider.
    #[error("provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Storage or signing failure on our side.
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl AuthFlowError {
    /// HTTP status for JSON responses.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::ReplayOrExpired => 400,
            Self::ProviderRejected { status, .. } => {
                if *status >= 400 && *status < 500 {
                    *status
                } else {
                    502
                }
            }
            Self::IdentityMismatch(_) => 401,
            Self::UpstreamUnavailable(_) => 503,
            Self::InternalFailure(_) => 500,
        }
    }

    /// Short code placed in `/auth/error?error=` redirects.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ReplayOrExpired => "invalid_state",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::IdentityMismatch(_) => "identity_mismatch",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::InternalFailure(_) => "internal_error",
        }
    }

    /// Variant label for structured logs.
    #[must_use]
    pub const fn error_label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ReplayOrExpired => "replay_or_expired",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::IdentityMismatch(_) => "identity_mismatch",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::InternalFailure(_) => "internal_failure",
        }
    }

    /// Message safe to return to a client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(detail) => detail.clone(),
            Self::ReplayOrExpired => "invalid or expired session".to_string(),
            Self::ProviderRejected { .. } => "provider rejected the request".to_string(),
            Self::IdentityMismatch(_) => "identity verification failed".to_string(),
            Self::UpstreamUnavailable(_) => "provider unavailable, please retry".to_string(),
            Self::InternalFailure(_) => "internal error".to_string(),
        }
    }
}

impl From<MoneymonError> for AuthFlowError {
    fn from(err: MoneymonError) -> Self {
        match err {
            MoneymonError::Network(msg) => Self::UpstreamUnavailable(msg),
            MoneymonError::Auth(msg) | MoneymonError::Security(msg) => Self::IdentityMismatch(msg),
            MoneymonError::InvalidInput(msg) => Self::InvalidRequest(msg),
            other => Self::InternalFailure(other.to_string()),
        }
    }
}
