//! Application error type and its HTTP representation.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Every failure the creation and resolution paths can surface.
///
/// Validation and SSRF failures are raised before any persistence write.
/// Click-tracking failures never reach this type; they are logged by the
/// recorder and dropped.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed URL, alias shape, or request body.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Destination rejected by the SSRF guard.
    #[error("{message}")]
    SsrfBlocked { message: String, details: Value },

    /// Requested custom alias is already issued.
    #[error("{message}")]
    AliasTaken { message: String, details: Value },

    /// Store-level uniqueness conflict on a generated short code.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Short code generation gave up after the bounded number of attempts.
    #[error("{message}")]
    CollisionExhausted { message: String, details: Value },

    /// Client exceeded its admission window.
    #[error("{message}")]
    RateLimited {
        message: String,
        details: Value,
        retry_after_secs: u64,
    },

    /// Unknown, inactive, or expired short code.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Store or other infrastructure failure.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn ssrf_blocked(message: impl Into<String>, details: Value) -> Self {
        Self::SsrfBlocked {
            message: message.into(),
            details,
        }
    }

    pub fn alias_taken(message: impl Into<String>, details: Value) -> Self {
        Self::AliasTaken {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn collision_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::CollisionExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, details: Value, retry_after_secs: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
            retry_after_secs,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::SsrfBlocked { .. } => StatusCode::BAD_REQUEST,
            Self::AliasTaken { .. } | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::CollisionExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code exposed in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::SsrfBlocked { .. } => "ssrf_blocked",
            Self::AliasTaken { .. } => "alias_taken",
            Self::Conflict { .. } => "conflict",
            Self::CollisionExhausted { .. } => "collision_exhausted",
            Self::RateLimited { .. } => "rate_limited",
            Self::NotFound { .. } => "not_found",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (message, details) = match self {
            Self::Validation { message, details }
            | Self::SsrfBlocked { message, details }
            | Self::AliasTaken { message, details }
            | Self::Conflict { message, details }
            | Self::CollisionExhausted { message, details }
            | Self::RateLimited {
                message, details, ..
            }
            | Self::NotFound { message, details }
            | Self::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code: self.code(),
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = match &self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

/// Postgres constraint names carrying the uniqueness guarantees.
const SHORT_CODE_CONSTRAINT: &str = "links_short_code_key";
const CUSTOM_ALIAS_CONSTRAINT: &str = "links_custom_alias_key";

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return match db.constraint() {
                Some(CUSTOM_ALIAS_CONSTRAINT) => {
                    AppError::alias_taken("Custom alias is already taken", json!({}))
                }
                Some(SHORT_CODE_CONSTRAINT) => {
                    AppError::conflict("Short code already exists", json!({}))
                }
                other => AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": other }),
                ),
            };
        }

        if let Some(db) = e.as_database_error()
            && db.is_foreign_key_violation()
        {
            return AppError::not_found("Referenced record not found", json!({}));
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        AppError::bad_request("Request validation failed", json!({ "fields": fields }))
    }
}
