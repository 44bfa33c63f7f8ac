use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use officemate_auth::{AuthError, ErrorBody};
use officemate_core::email::EmailVerificationError;
use officemate_core::notify::NotificationError;
use officemate_core::profile::ProfileError;
use officemate_core::route::RouteError;
use officemate_core::safety::SafetyError;
use officemate_core::storage::{repository_error_to_status_code, RepositoryError};
use officemate_core::wallet::WalletError;

use crate::crypto::CryptoError;

/// Handler error. Known domain errors map to their status and code; anything
/// else is a 500 with the details kept out of the body.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        let message = self.0.to_string();

        if let Some(err) = self.0.downcast_ref::<ProfileError>() {
            return (profile_status(err), profile_code(err), message);
        }
        if let Some(err) = self.0.downcast_ref::<WalletError>() {
            return (wallet_status(err), err.code(), message);
        }
        if let Some(err) = self.0.downcast_ref::<SafetyError>() {
            return (safety_status(err), safety_code(err), message);
        }
        if let Some(err) = self.0.downcast_ref::<RouteError>() {
            return (StatusCode::BAD_REQUEST, route_code(err), message);
        }
        if let Some(err) = self.0.downcast_ref::<EmailVerificationError>() {
            return (email_status(err), err.code(), message);
        }
        if let Some(err) = self.0.downcast_ref::<AuthError>() {
            return err.parts();
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            let status = StatusCode::from_u16(repository_error_to_status_code(err))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                return (status, "STORAGE_ERROR", "Internal server error".to_string());
            }
            return (status, "STORAGE_ERROR", message);
        }
        if self.0.downcast_ref::<NotificationError>().is_some() {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOTIFICATION_FAILED",
                "Failed to deliver notification".to_string(),
            );
        }
        if self.0.downcast_ref::<CryptoError>().is_some() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENCRYPTION_ERROR",
                "Internal server error".to_string(),
            );
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error".to_string(),
        )
    }
}

fn profile_status(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::VerificationRequired { .. } => StatusCode::FORBIDDEN,
        ProfileError::AccountNotFound
        | ProfileError::ProfileNotFound
        | ProfileError::DriverProfileNotFound
        | ProfileError::RiderProfileNotFound => StatusCode::NOT_FOUND,
        ProfileError::ProfileExists
        | ProfileError::DriverProfileExists
        | ProfileError::RiderProfileExists
        | ProfileError::LicenseAlreadyRegistered(_) => StatusCode::CONFLICT,
        ProfileError::LicenseExpired
        | ProfileError::InvalidCapacity { .. }
        | ProfileError::Validation(_)
        | ProfileError::Route(_) => StatusCode::BAD_REQUEST,
    }
}

fn profile_code(err: &ProfileError) -> &'static str {
    match err {
        ProfileError::VerificationRequired { .. } => "VERIFICATION_REQUIRED",
        ProfileError::AccountNotFound => "USER_NOT_FOUND",
        ProfileError::ProfileExists
        | ProfileError::DriverProfileExists
        | ProfileError::RiderProfileExists => "PROFILE_EXISTS",
        ProfileError::ProfileNotFound
        | ProfileError::DriverProfileNotFound
        | ProfileError::RiderProfileNotFound => "PROFILE_NOT_FOUND",
        ProfileError::LicenseAlreadyRegistered(_) => "LICENSE_ALREADY_REGISTERED",
        ProfileError::LicenseExpired => "LICENSE_EXPIRED",
        ProfileError::InvalidCapacity { .. } => "INVALID_CAPACITY",
        ProfileError::Validation(_) => "VALIDATION_ERROR",
        ProfileError::Route(err) => route_code(err),
    }
}

fn wallet_status(err: &WalletError) -> StatusCode {
    match err {
        WalletError::VerificationRequired => StatusCode::FORBIDDEN,
        WalletError::WalletAlreadyExists
        | WalletError::PaymentMethodDuplicate
        | WalletError::ConcurrentUpdate => StatusCode::CONFLICT,
        WalletError::WalletNotFound
        | WalletError::PaymentMethodNotFound
        | WalletError::QrCodeNotFound => StatusCode::NOT_FOUND,
        WalletError::QrCodeNotOwned => StatusCode::FORBIDDEN,
        WalletError::QrCodeInactive => StatusCode::GONE,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn safety_status(err: &SafetyError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if matches!(err, SafetyError::ActiveSosExists) {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn safety_code(err: &SafetyError) -> &'static str {
    match err {
        SafetyError::EmergencyContactLimit(_) | SafetyError::FamilySharingLimit(_) => {
            "LIMIT_EXCEEDED"
        }
        SafetyError::Validation(_) => "VALIDATION_ERROR",
        SafetyError::EmergencyContactNotFound | SafetyError::FamilyContactNotFound => {
            "CONTACT_NOT_FOUND"
        }
        SafetyError::MissingCoordinates
        | SafetyError::InvalidLatitude
        | SafetyError::InvalidLongitude => "INVALID_LOCATION",
        SafetyError::ActiveSosExists => "ACTIVE_SOS_EXISTS",
        SafetyError::SosNotFound => "SOS_NOT_FOUND",
        SafetyError::SosNotActive => "SOS_NOT_ACTIVE",
        SafetyError::LocationShareNotFound => "LOCATION_SHARE_NOT_FOUND",
        SafetyError::LocationShareNotActive => "LOCATION_SHARE_NOT_ACTIVE",
    }
}

fn route_code(err: &RouteError) -> &'static str {
    match err {
        RouteError::Validation(_) => "VALIDATION_ERROR",
        RouteError::InvalidRouteType(_) => "INVALID_ROUTE_TYPE",
    }
}

fn email_status(err: &EmailVerificationError) -> StatusCode {
    match err {
        EmailVerificationError::UserNotFound => StatusCode::NOT_FOUND,
        EmailVerificationError::EmailAlreadyExists
        | EmailVerificationError::ActiveVerificationExists => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error.message = %self.0, error.code = code, "Request failed");
        }

        ErrorBody::response(status, code, message)
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(err: impl Into<anyhow::Error>) -> (StatusCode, &'static str, String) {
        AppError(err.into()).parts()
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(
            parts(ProfileError::VerificationRequired {
                mobile_verified: true,
                email_verified: false
            })
            .0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            parts(ProfileError::LicenseAlreadyRegistered("KA-01".into())).0,
            StatusCode::CONFLICT
        );
        assert_eq!(parts(WalletError::WalletNotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(parts(WalletError::ConcurrentUpdate).0, StatusCode::CONFLICT);
        assert_eq!(parts(WalletError::QrCodeNotOwned).0, StatusCode::FORBIDDEN);
        assert_eq!(parts(WalletError::QrCodeInactive).0, StatusCode::GONE);
        assert_eq!(parts(SafetyError::SosNotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(parts(SafetyError::ActiveSosExists).0, StatusCode::CONFLICT);
        assert_eq!(
            parts(EmailVerificationError::ActiveVerificationExists).0,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_codes_come_from_domain() {
        let (status, code, message) = parts(WalletError::InsufficientBalance);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "INSUFFICIENT_BALANCE");
        assert_eq!(message, WalletError::InsufficientBalance.to_string());

        let (_, code, _) = parts(EmailVerificationError::InvalidOtp { remaining: 2 });
        assert_eq!(code, "INVALID_OTP");
    }

    #[test]
    fn test_unknown_errors_hide_details() {
        let (status, code, message) = parts(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_repository_not_found_keeps_message() {
        let (status, _, message) = parts(RepositoryError::not_found("Wallet", "42"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("42"));
    }
}
