use thiserror::Error;

use super::VehicleType;
use crate::route::RouteError;

/// Errors raised while creating or changing profiles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Both mobile and email verification required before creating profile")]
    VerificationRequired {
        mobile_verified: bool,
        email_verified: bool,
    },
    #[error("User account not found")]
    AccountNotFound,
    #[error("Profile already exists for user")]
    ProfileExists,
    #[error("Driver profile already exists for user")]
    DriverProfileExists,
    #[error("Rider profile already exists for user")]
    RiderProfileExists,
    #[error("Profile not found for user")]
    ProfileNotFound,
    #[error("Driver profile not found for user")]
    DriverProfileNotFound,
    #[error("Rider profile not found for user")]
    RiderProfileNotFound,
    #[error("License number already registered: {0}")]
    LicenseAlreadyRegistered(String),
    #[error("License expiry date must be in the future")]
    LicenseExpired,
    #[error("{} capacity must be between {min} and {max} passengers", .vehicle_type.display_name())]
    InvalidCapacity {
        vehicle_type: VehicleType,
        min: u8,
        max: u8,
    },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Route(#[from] RouteError),
}
