//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Moneymon
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MoneymonError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness constraint rejected a write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MoneymonError {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Security(_) => "security",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Moneymon operations
pub type Result<T> = std::result::Result<T, MoneymonError>;

#[cfg(test)]
mod tests {
    //! Unit tests for errors.
    use super::*;

    /// Validates serde tagging of `MoneymonError`.
    ///
    /// Assertions:
    /// - Confirms the serialized form carries `type` and `message` keys.
    /// - Confirms the value round-trips back to the same variant.
    #[test]
    fn error_serializes_with_type_tag() {
        let err = MoneymonError::Conflict("users(email, provider)".into());
        let json = serde_json::to_value(&err).expect("error serializes");

        assert_eq!(json["type"], "Conflict");
        assert_eq!(json["message"], "users(email, provider)");

        let back: MoneymonError = serde_json::from_value(json).expect("error deserializes");
        assert_eq!(back, err);
    }

    /// Assertions:
    /// - Confirms each variant maps to its log label.
    #[test]
    fn labels_are_stable() {
        assert_eq!(MoneymonError::Database(String::new()).label(), "database");
        assert_eq!(MoneymonError::Network(String::new()).label(), "network");
        assert_eq!(MoneymonError::Conflict(String::new()).label(), "conflict");
    }
}
