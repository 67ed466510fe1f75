/// Error handling for the API server
///
/// A single error type that maps to HTTP responses. Handlers return
/// `ApiResult<T>`; every store or validation failure is translated here and
/// nothing propagates uncaught to the transport layer.
///
/// Two deliberate information-hiding rules live in this mapping:
/// - every authentication failure (missing header, bad signature, revoked
///   token, deleted user) renders the identical generic 401 body
/// - `NotFound` carries no body at all, so "never existed" and "belongs to
///   someone else" are indistinguishable
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-policy input (400), body echoes field detail
    Validation(Vec<ValidationErrorDetail>),

    /// Bad login credentials (400), generic body regardless of which
    /// credential was wrong
    LoginFailed,

    /// Update payload contained a field outside the allow-list (400)
    InvalidUpdate,

    /// Rejected upload (400), body carries the reason
    Upload(String),

    /// Other malformed request (400)
    BadRequest(String),

    /// Authentication failed (401), generic body
    Unauthenticated,

    /// Resource absent or not owned by the caller (404), empty body
    NotFound,

    /// Unexpected failure (500), detail logged but never sent to the client
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format for validation and bad-request errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Shorthand for a single-field validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::LoginFailed => write!(f, "Unable to login"),
            ApiError::InvalidUpdate => write!(f, "Invalid update"),
            ApiError::Upload(msg) => write!(f, "Rejected upload: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthenticated => write!(f, "Authentication required"),
            ApiError::NotFound => write!(f, "Not found"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "validation_error".to_string(),
                    message: "Request validation failed".to_string(),
                    details: Some(errors),
                }),
            )
                .into_response(),
            ApiError::LoginFailed => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Unable to login." })),
            )
                .into_response(),
            ApiError::InvalidUpdate => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid update." })),
            )
                .into_response(),
            ApiError::Upload(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "bad_request".to_string(),
                    message,
                    details: None,
                }),
            )
                .into_response(),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please authenticate." })),
            )
                .into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Internal(msg) => {
                // Log the detail, never send it to the client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "internal_error".to_string(),
                        message: "An internal error occurred".to_string(),
                        details: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db_err) => {
                // Duplicate email surfaces as a unique-constraint violation
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::validation("email", "Email already in use.");
                    }
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::Validation(errors)
    }
}

/// Convert password hashing errors to API errors
impl From<taskhub_shared::auth::password::PasswordError> for ApiError {
    fn from(err: taskhub_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
///
/// Token issuance happens after credentials were already accepted, so a
/// failure there is a server fault, not an authentication outcome.
impl From<taskhub_shared::auth::token::TokenError> for ApiError {
    fn from(err: taskhub_shared::auth::token::TokenError) -> Self {
        ApiError::Internal(format!("Token operation failed: {}", err))
    }
}

/// Convert avatar processing errors to API errors
impl From<taskhub_shared::avatar::AvatarError> for ApiError {
    fn from(err: taskhub_shared::avatar::AvatarError) -> Self {
        ApiError::Upload(err.to_string())
    }
}
