//! User, driver and rider profiles.

mod error;
mod operations;
mod requests;
mod types;

pub use error::ProfileError;
pub use operations::{
    add_unique, apply_driver_update, apply_profile_update, apply_rider_update,
    build_driver_profile, build_rider_profile, build_user_profile, remove_item,
    validate_license_expiry, validate_vehicle,
};
pub use requests::{
    CreateProfileRequest, DriverProfileRequest, RiderProfileRequest, UpdateDriverProfileRequest,
    UpdateProfileRequest, UpdateRiderProfileRequest,
};
pub use types::{
    DriverProfile, FuelType, Gender, GenderPreference, ProfileView, RiderProfile, UserProfile,
    Vehicle, VehicleType, DEFAULT_MAX_DETOUR_METERS,
};
