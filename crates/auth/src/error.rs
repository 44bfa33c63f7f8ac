use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use officemate_core::account::AccountError;
use officemate_core::storage::{repository_error_to_status_code, RepositoryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Auth errors for the officemate_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for I/O operations that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (OTP checks, token parsing, etc.)
    #[error(transparent)]
    Core(#[from] officemate_core::auth::AuthError),

    /// Phone number normalization or account state errors
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Relational storage error
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Missing or unusable credentials
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Authenticated but not allowed to act on the resource
    #[error("{0}")]
    Forbidden(&'static str),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// JSON error payload shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ErrorBody {
    pub fn response(
        status: StatusCode,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Response {
        let body = Self {
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl AuthError {
    /// Status, machine-readable code and client-facing message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        use officemate_core::auth::AuthError as CoreError;

        match self {
            AuthError::Core(core_err) => match core_err {
                CoreError::InvalidOtp { remaining } => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_OTP",
                    format!("Invalid OTP. Remaining attempts: {}", remaining),
                ),
                CoreError::OtpNotFound => (
                    StatusCode::BAD_REQUEST,
                    "OTP_NOT_FOUND",
                    "OTP not found or expired. Please request a new one.".to_string(),
                ),
                CoreError::OtpAlreadyUsed => (
                    StatusCode::BAD_REQUEST,
                    "OTP_ALREADY_USED",
                    "OTP has already been used".to_string(),
                ),
                CoreError::OtpExpired => (
                    StatusCode::BAD_REQUEST,
                    "OTP_EXPIRED",
                    "OTP has expired. Please request a new one.".to_string(),
                ),
                CoreError::MaxAttemptsExceeded => (
                    StatusCode::BAD_REQUEST,
                    "MAX_ATTEMPTS_EXCEEDED",
                    "Maximum verification attempts exceeded. Please request a new OTP."
                        .to_string(),
                ),
                CoreError::MalformedOtp => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_OTP_FORMAT",
                    "OTP must be a 6-digit code".to_string(),
                ),
                CoreError::RateLimited(message) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT_EXCEEDED",
                    message.clone(),
                ),
                CoreError::AccountLocked => (
                    StatusCode::LOCKED,
                    "ACCOUNT_LOCKED",
                    "Account locked due to too many failed attempts".to_string(),
                ),
                CoreError::PhoneAlreadyRegistered => (
                    StatusCode::CONFLICT,
                    "PHONE_ALREADY_REGISTERED",
                    "Phone number already registered".to_string(),
                ),
                CoreError::PhoneNotRegistered => (
                    StatusCode::NOT_FOUND,
                    "PHONE_NOT_REGISTERED",
                    "Phone number not registered".to_string(),
                ),
                CoreError::AccountSuspended => (
                    StatusCode::FORBIDDEN,
                    "ACCOUNT_SUSPENDED",
                    "Account is suspended".to_string(),
                ),
                CoreError::SessionNotFound => (
                    StatusCode::UNAUTHORIZED,
                    "SESSION_NOT_FOUND",
                    "Session not found".to_string(),
                ),
                CoreError::SessionExpired => (
                    StatusCode::UNAUTHORIZED,
                    "SESSION_EXPIRED",
                    "Session expired".to_string(),
                ),
                CoreError::TokenExpired => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_EXPIRED",
                    "Token has expired".to_string(),
                ),
                CoreError::InvalidSignature => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "Invalid token signature".to_string(),
                ),
                CoreError::MalformedToken => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "Malformed token".to_string(),
                ),
                CoreError::WrongTokenType { expected } => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    format!("Invalid token type: expected {}", expected),
                ),
                CoreError::TokenRevoked => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_REVOKED",
                    "Token has been revoked".to_string(),
                ),
                CoreError::Notification(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "NOTIFICATION_FAILED",
                    "Unable to deliver verification code. Please try again.".to_string(),
                ),
                CoreError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                ),
            },
            AuthError::Account(AccountError::InvalidPhoneNumber(_)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PHONE_NUMBER",
                self.to_string(),
            ),
            AuthError::Account(AccountError::NotFullyVerified) => (
                StatusCode::FORBIDDEN,
                "VERIFICATION_REQUIRED",
                self.to_string(),
            ),
            AuthError::Repository(repo_err) => {
                let status = StatusCode::from_u16(repository_error_to_status_code(repo_err))
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    (status, "STORAGE_ERROR", "Internal server error".to_string())
                } else {
                    (status, "STORAGE_ERROR", self.to_string())
                }
            }
            AuthError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                message.to_string(),
            ),
            AuthError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, "ACCESS_DENIED", message.to_string())
            }
            AuthError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                "Server configuration error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error.message = %self, error.code = code, "Auth error");
        }

        ErrorBody::response(status, code, message)
    }
}
