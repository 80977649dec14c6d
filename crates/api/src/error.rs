//! HTTP error mapping
//!
//! Every failure leaves the server as the JSON envelope
//! `{success: false, message, error}`. `message` is client-safe; detailed
//! causes are logged and never serialized.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use moneymon_core::AuthFlowError;
use moneymon_domain::MoneymonError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login flow failure; status and message come from the variant.
    #[error(transparent)]
    Flow(#[from] AuthFlowError),

    /// Missing or malformed bearer token.
    #[error("authentication required")]
    Unauthenticated,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Flow(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Flow(err) => err.error_code(),
            Self::Unauthenticated => "unauthenticated",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Flow(err) => err.client_message(),
            Self::Unauthenticated => self.to_string(),
        }
    }
}

impl From<MoneymonError> for ApiError {
    fn from(err: MoneymonError) -> Self {
        Self::Flow(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = format!("invalid request body: {}", rejection.body_text());
        Self::Flow(AuthFlowError::InvalidRequest(message))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let message = format!("invalid query: {}", rejection.body_text());
        Self::Flow(AuthFlowError::InvalidRequest(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody { success: false, message: self.client_message(), error: self.code() };
        (status, Json(body)).into_response()
    }
}
