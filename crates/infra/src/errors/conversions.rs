//! Conversions from external infrastructure errors into domain errors.

use moneymon_domain::MoneymonError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MoneymonError);

impl From<InfraError> for MoneymonError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MoneymonError> for InfraError {
    fn from(value: MoneymonError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMoneymonError {
    fn into_moneymon(self) -> MoneymonError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → MoneymonError */
/* -------------------------------------------------------------------------- */

impl IntoMoneymonError for SqlError {
    fn into_moneymon(self) -> MoneymonError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        MoneymonError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        MoneymonError::Database("database is locked".into())
                    }
                    // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        MoneymonError::Conflict(format!("unique constraint violation: {message}"))
                    }
                    _ => MoneymonError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => MoneymonError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                MoneymonError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                MoneymonError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                MoneymonError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                MoneymonError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => MoneymonError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => MoneymonError::Database("invalid SQL query".into()),
            other => MoneymonError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_moneymon())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MoneymonError */
/* -------------------------------------------------------------------------- */

impl IntoMoneymonError for HttpError {
    fn into_moneymon(self) -> MoneymonError {
        if self.is_timeout() {
            return MoneymonError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MoneymonError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return MoneymonError::Network(format!("malformed provider response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => MoneymonError::Auth(message),
                404 => MoneymonError::NotFound(message),
                400..=499 => MoneymonError::InvalidInput(message),
                _ => MoneymonError::Network(message),
            };
        }

        MoneymonError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_moneymon())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
