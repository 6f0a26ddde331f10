//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`FilterError`] is what the filter machinery itself returns. It separates
//!   client mistakes (a query string that fails validation) from programmer
//!   mistakes (a schema whose constants point at a field it never declared).
//! - [`ApiError`] is the HTTP boundary type. It implements axum's
//!   [`IntoResponse`], so handlers can use `?` on a [`FilterError`] or a
//!   sea-orm `DbErr` and still answer with a sanitized response.
//!
//! Validation failures always produce the same 422 payload, whether they were
//! raised while binding query parameters or while rebuilding the declared
//! filter afterwards:
//!
//! ```json
//! {"detail": [{"loc": ["order_by"], "msg": "...", "type": "value_error"}]}
//! ```
//!
//! ## Logging
//!
//! Internal error details are logged using the `tracing` crate and never sent
//! to clients. Install a subscriber in your application to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt().with_target(false).compact().init();
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

use crate::validation::ValidationErrors;

/// Error returned by filter construction, reconstruction and backends
#[derive(Debug)]
pub enum FilterError {
    /// Input failed validation; recoverable, reported to the client
    Validation(ValidationErrors),
    /// The schema declaration itself is inconsistent
    Configuration {
        /// Description of the misconfiguration
        message: String,
    },
}

impl FilterError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::Configuration { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for FilterError {}

impl From<ValidationErrors> for FilterError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 422 Unprocessable Entity - request parameters failed validation
    RequestValidation {
        /// Per-field validation errors, sent to the client as-is
        errors: ValidationErrors,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 422 request validation error
    pub fn request_validation(errors: ValidationErrors) -> Self {
        Self::RequestValidation { errors }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// # Example
    /// ```rust,ignore
    /// let todos = query.all(&db).await.map_err(ApiError::database)?;
    /// ```
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::RequestValidation { errors } => {
                format!("Request validation failed with {} error(s)", errors.len())
            }
            Self::Database { message, .. } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
#[serde(untagged)]
enum ErrorResponse<'a> {
    Validation { detail: &'a ValidationErrors },
    Message { error: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = match &self {
            Self::RequestValidation { errors } => ErrorResponse::Validation { detail: errors },
            _ => ErrorResponse::Message {
                error: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// Validation failures become 422; configuration mistakes become a logged 500
impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Validation(errors) => Self::RequestValidation { errors },
            FilterError::Configuration { message } => Self::Internal {
                message: "Internal server error".to_string(),
                internal: Some(message),
            },
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}
