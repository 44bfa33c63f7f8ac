use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use uuid::Uuid;

use super::{
    CreateProfileRequest, DriverProfile, DriverProfileRequest, ProfileError, RiderProfile,
    RiderProfileRequest, UpdateDriverProfileRequest, UpdateProfileRequest,
    UpdateRiderProfileRequest, UserProfile, Vehicle, DEFAULT_MAX_DETOUR_METERS,
};
use crate::route::validate_route_input;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} '\-]+$").expect("valid name regex"));

static IMAGE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://\S+\.(jpg|jpeg|png|gif|webp)$").expect("valid image url regex")
});

static LICENSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9-]+$").expect("valid license regex"));

const MAX_NAME_LEN: usize = 50;
const MAX_IMAGE_URL_LEN: usize = 500;
const MAX_LICENSE_LEN: usize = 50;
const MAX_VEHICLE_TEXT_LEN: usize = 50;
const MAX_PLATE_LEN: usize = 20;
const MIN_VEHICLE_YEAR: i32 = 1990;
const MAX_VEHICLE_YEAR: i32 = 2030;

fn invalid(message: impl Into<String>) -> ProfileError {
    ProfileError::Validation(message.into())
}

fn validate_name(label: &str, value: &str) -> Result<(), ProfileError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(invalid(format!(
            "{} must be between 1 and {} characters",
            label, MAX_NAME_LEN
        )));
    }
    if !NAME_PATTERN.is_match(value) {
        return Err(invalid(format!(
            "{} must contain only letters, spaces, hyphens, and apostrophes",
            label
        )));
    }
    Ok(())
}

fn validate_image_url(url: &str) -> Result<(), ProfileError> {
    if url.len() > MAX_IMAGE_URL_LEN {
        return Err(invalid("Profile image URL is too long"));
    }
    if !IMAGE_URL_PATTERN.is_match(url) {
        return Err(invalid(
            "Profile image URL must be a valid HTTP/HTTPS URL ending with jpg, jpeg, png, gif, or webp",
        ));
    }
    Ok(())
}

fn validate_date_of_birth(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), ProfileError> {
    if date_of_birth >= today {
        return Err(invalid("Date of birth must be in the past"));
    }
    Ok(())
}

/// Builds a new basic profile after validating names, birth date and image URL.
pub fn build_user_profile(
    user_id: Uuid,
    request: &CreateProfileRequest,
    now: DateTime<Utc>,
) -> Result<UserProfile, ProfileError> {
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    validate_name("First name", first_name)?;
    validate_name("Last name", last_name)?;
    if let Some(dob) = request.date_of_birth {
        validate_date_of_birth(dob, now.date_naive())?;
    }
    if let Some(url) = &request.profile_image_url {
        validate_image_url(url)?;
    }

    Ok(UserProfile {
        user_id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        profile_image_url: request.profile_image_url.clone(),
        date_of_birth: request.date_of_birth,
        gender: request.gender,
        created_at: now,
        updated_at: now,
    })
}

/// Applies the provided fields of `request`. Validation happens before any
/// field is touched, so a rejected update leaves the profile unchanged.
pub fn apply_profile_update(
    profile: &mut UserProfile,
    request: &UpdateProfileRequest,
    now: DateTime<Utc>,
) -> Result<(), ProfileError> {
    if let Some(first_name) = &request.first_name {
        validate_name("First name", first_name)?;
    }
    if let Some(last_name) = &request.last_name {
        validate_name("Last name", last_name)?;
    }
    if let Some(dob) = request.date_of_birth {
        validate_date_of_birth(dob, now.date_naive())?;
    }
    if let Some(url) = &request.profile_image_url {
        validate_image_url(url)?;
    }

    if let Some(first_name) = &request.first_name {
        profile.first_name = first_name.clone();
    }
    if let Some(last_name) = &request.last_name {
        profile.last_name = last_name.clone();
    }
    if request.date_of_birth.is_some() {
        profile.date_of_birth = request.date_of_birth;
    }
    if request.gender.is_some() {
        profile.gender = request.gender;
    }
    if request.profile_image_url.is_some() {
        profile.profile_image_url = request.profile_image_url.clone();
    }
    profile.updated_at = now;
    Ok(())
}

fn validate_license_number(license_number: &str) -> Result<(), ProfileError> {
    if license_number.is_empty() {
        return Err(invalid("License number is required"));
    }
    if license_number.len() > MAX_LICENSE_LEN {
        return Err(invalid(format!(
            "License number must not exceed {} characters",
            MAX_LICENSE_LEN
        )));
    }
    if !LICENSE_PATTERN.is_match(license_number) {
        return Err(invalid(
            "License number must contain only uppercase letters, numbers, and hyphens",
        ));
    }
    Ok(())
}

/// A license must still be valid after today.
pub fn validate_license_expiry(expiry: NaiveDate, today: NaiveDate) -> Result<(), ProfileError> {
    if expiry <= today {
        return Err(ProfileError::LicenseExpired);
    }
    Ok(())
}

fn validate_detour(meters: u32) -> Result<(), ProfileError> {
    if meters > DEFAULT_MAX_DETOUR_METERS {
        return Err(invalid(format!(
            "Maximum detour distance must not exceed {} meters",
            DEFAULT_MAX_DETOUR_METERS
        )));
    }
    Ok(())
}

/// Checks vehicle descriptors and the capacity allowed for its type.
pub fn validate_vehicle(vehicle: &Vehicle) -> Result<(), ProfileError> {
    let make = vehicle.make.trim();
    if make.is_empty() || make.len() > MAX_VEHICLE_TEXT_LEN {
        return Err(invalid("Vehicle make is required (max 50 characters)"));
    }
    let model = vehicle.model.trim();
    if model.is_empty() || model.len() > MAX_VEHICLE_TEXT_LEN {
        return Err(invalid("Vehicle model is required (max 50 characters)"));
    }
    if !(MIN_VEHICLE_YEAR..=MAX_VEHICLE_YEAR).contains(&vehicle.year) {
        return Err(invalid(format!(
            "Vehicle year must be between {} and {}",
            MIN_VEHICLE_YEAR, MAX_VEHICLE_YEAR
        )));
    }
    let plate = vehicle.license_plate.trim();
    if plate.is_empty() || plate.len() > MAX_PLATE_LEN {
        return Err(invalid("License plate is required (max 20 characters)"));
    }

    let (min, max) = vehicle.vehicle_type.capacity_range();
    if !(min..=max).contains(&vehicle.capacity) {
        return Err(ProfileError::InvalidCapacity {
            vehicle_type: vehicle.vehicle_type,
            min,
            max,
        });
    }
    Ok(())
}

/// Builds an unverified driver profile. License uniqueness is checked by the caller.
pub fn build_driver_profile(
    driver_id: Uuid,
    request: &DriverProfileRequest,
    now: DateTime<Utc>,
) -> Result<DriverProfile, ProfileError> {
    validate_license_number(&request.license_number)?;
    validate_license_expiry(request.license_expiry, now.date_naive())?;
    validate_vehicle(&request.vehicle)?;
    validate_detour(request.max_detour_meters)?;
    if let Some(route) = &request.route_preferences {
        validate_route_input(route)?;
    }

    Ok(DriverProfile {
        driver_id,
        license_number: request.license_number.clone(),
        license_expiry: request.license_expiry,
        license_verified: false,
        max_detour_meters: request.max_detour_meters,
        vehicle: request.vehicle.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Applies a driver update and returns whether license details changed.
///
/// A changed license number or expiry clears `license_verified`.
pub fn apply_driver_update(
    profile: &mut DriverProfile,
    request: &UpdateDriverProfileRequest,
    now: DateTime<Utc>,
) -> Result<bool, ProfileError> {
    let new_license = request
        .license_number
        .as_ref()
        .filter(|number| **number != profile.license_number);
    if let Some(number) = new_license {
        validate_license_number(number)?;
    }
    if let Some(expiry) = request.license_expiry {
        validate_license_expiry(expiry, now.date_naive())?;
    }
    if let Some(vehicle) = &request.vehicle {
        validate_vehicle(vehicle)?;
    }
    if let Some(meters) = request.max_detour_meters {
        validate_detour(meters)?;
    }
    if let Some(route) = &request.route_preferences {
        validate_route_input(route)?;
    }

    let mut license_changed = false;
    if let Some(number) = new_license {
        profile.license_number = number.clone();
        license_changed = true;
    }
    if let Some(expiry) = request.license_expiry {
        profile.license_expiry = expiry;
        license_changed = true;
    }
    if license_changed {
        profile.license_verified = false;
    }
    if let Some(vehicle) = &request.vehicle {
        profile.vehicle = vehicle.clone();
    }
    if let Some(meters) = request.max_detour_meters {
        profile.max_detour_meters = meters;
    }
    profile.updated_at = now;
    Ok(license_changed)
}

/// Pushes `item` unless already present. Returns whether it was added.
pub fn add_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

/// Removes every occurrence of `item`. Returns whether anything was removed.
pub fn remove_item<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
    let before = items.len();
    items.retain(|existing| existing != item);
    items.len() != before
}

fn dedup<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        add_unique(&mut unique, item.clone());
    }
    unique
}

pub fn build_rider_profile(
    rider_id: Uuid,
    request: &RiderProfileRequest,
    now: DateTime<Utc>,
) -> Result<RiderProfile, ProfileError> {
    validate_route_input(&request.route_preferences)?;
    if request.favorite_drivers.contains(&rider_id) {
        return Err(invalid("Riders cannot add themselves as a favorite driver"));
    }

    Ok(RiderProfile {
        rider_id,
        gender_preference: request.gender_preference.unwrap_or_default(),
        vehicle_type_preferences: dedup(&request.vehicle_type_preferences),
        favorite_drivers: dedup(&request.favorite_drivers),
        created_at: now,
        updated_at: now,
    })
}

pub fn apply_rider_update(
    profile: &mut RiderProfile,
    request: &UpdateRiderProfileRequest,
    now: DateTime<Utc>,
) -> Result<(), ProfileError> {
    if let Some(route) = &request.route_preferences {
        validate_route_input(route)?;
    }
    if let Some(drivers) = &request.favorite_drivers {
        if drivers.contains(&profile.rider_id) {
            return Err(invalid("Riders cannot add themselves as a favorite driver"));
        }
    }

    if let Some(preference) = request.gender_preference {
        profile.gender_preference = preference;
    }
    if let Some(types) = &request.vehicle_type_preferences {
        profile.vehicle_type_preferences = dedup(types);
    }
    if let Some(drivers) = &request.favorite_drivers {
        profile.favorite_drivers = dedup(drivers);
    }
    profile.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{FuelType, Gender, GenderPreference, VehicleType};
    use chrono::Duration;

    fn car(capacity: u8) -> Vehicle {
        Vehicle {
            vehicle_type: VehicleType::Car,
            make: "Maruti".to_string(),
            model: "Dzire".to_string(),
            year: 2021,
            license_plate: "KA01AB1234".to_string(),
            capacity,
            fuel_type: FuelType::Cng,
        }
    }

    fn driver_request(now: DateTime<Utc>) -> DriverProfileRequest {
        DriverProfileRequest {
            license_number: "KA-0120210001234".to_string(),
            license_expiry: now.date_naive() + Duration::days(365),
            vehicle: car(4),
            max_detour_meters: DEFAULT_MAX_DETOUR_METERS,
            route_preferences: None,
        }
    }

    fn create_request() -> CreateProfileRequest {
        CreateProfileRequest {
            first_name: "Ananya".to_string(),
            last_name: "D'Souza".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1994, 7, 12),
            gender: Some(Gender::Female),
            profile_image_url: Some("https://cdn.example.com/u/ananya.png".to_string()),
        }
    }

    // ==================== Basic Profile Tests ====================

    #[test]
    fn builds_profile_with_valid_fields() {
        let now = Utc::now();
        let profile = build_user_profile(Uuid::new_v4(), &create_request(), now).unwrap();
        assert_eq!(profile.last_name, "D'Souza");
        assert_eq!(profile.created_at, now);
    }

    #[test]
    fn rejects_names_with_digits() {
        let mut request = create_request();
        request.first_name = "R2D2".to_string();
        assert_eq!(
            build_user_profile(Uuid::new_v4(), &request, Utc::now()),
            Err(ProfileError::Validation(
                "First name must contain only letters, spaces, hyphens, and apostrophes"
                    .to_string()
            ))
        );
    }

    #[test]
    fn rejects_future_date_of_birth() {
        let now = Utc::now();
        let mut request = create_request();
        request.date_of_birth = Some(now.date_naive() + Duration::days(1));
        assert!(build_user_profile(Uuid::new_v4(), &request, now).is_err());
    }

    #[test]
    fn rejects_non_image_url() {
        let mut request = create_request();
        request.profile_image_url = Some("ftp://example.com/me.exe".to_string());
        assert!(build_user_profile(Uuid::new_v4(), &request, Utc::now()).is_err());
    }

    #[test]
    fn update_changes_only_provided_fields() {
        let now = Utc::now();
        let mut profile = build_user_profile(Uuid::new_v4(), &create_request(), now).unwrap();
        let update = UpdateProfileRequest {
            last_name: Some("Rao".to_string()),
            ..Default::default()
        };
        apply_profile_update(&mut profile, &update, now).unwrap();
        assert_eq!(profile.first_name, "Ananya");
        assert_eq!(profile.last_name, "Rao");
    }

    #[test]
    fn rejected_update_leaves_profile_untouched() {
        let now = Utc::now();
        let mut profile = build_user_profile(Uuid::new_v4(), &create_request(), now).unwrap();
        let original = profile.clone();
        let update = UpdateProfileRequest {
            first_name: Some("Valid".to_string()),
            last_name: Some("1nvalid".to_string()),
            ..Default::default()
        };
        assert!(apply_profile_update(&mut profile, &update, now).is_err());
        assert_eq!(profile, original);
    }

    // ==================== Driver Profile Tests ====================

    #[test]
    fn builds_unverified_driver_profile() {
        let now = Utc::now();
        let profile = build_driver_profile(Uuid::new_v4(), &driver_request(now), now).unwrap();
        assert!(!profile.license_verified);
        assert_eq!(profile.max_detour_meters, 500);
    }

    #[test]
    fn rejects_expired_license() {
        let now = Utc::now();
        let mut request = driver_request(now);
        request.license_expiry = now.date_naive();
        assert_eq!(
            build_driver_profile(Uuid::new_v4(), &request, now),
            Err(ProfileError::LicenseExpired)
        );
    }

    #[test]
    fn rejects_lowercase_license_number() {
        let now = Utc::now();
        let mut request = driver_request(now);
        request.license_number = "ka-01".to_string();
        assert!(build_driver_profile(Uuid::new_v4(), &request, now).is_err());
    }

    #[test]
    fn car_capacity_is_one_to_seven() {
        assert!(validate_vehicle(&car(7)).is_ok());
        assert_eq!(
            validate_vehicle(&car(8)),
            Err(ProfileError::InvalidCapacity {
                vehicle_type: VehicleType::Car,
                min: 1,
                max: 7
            })
        );
        assert!(validate_vehicle(&car(0)).is_err());
    }

    #[test]
    fn two_wheeler_capacity_is_one_to_two() {
        let mut bike = car(2);
        bike.vehicle_type = VehicleType::Motorcycle;
        assert!(validate_vehicle(&bike).is_ok());
        bike.capacity = 3;
        assert_eq!(
            validate_vehicle(&bike).unwrap_err().to_string(),
            "Motorcycle capacity must be between 1 and 2 passengers"
        );
    }

    #[test]
    fn rejects_detour_above_limit() {
        let now = Utc::now();
        let mut request = driver_request(now);
        request.max_detour_meters = 501;
        assert!(build_driver_profile(Uuid::new_v4(), &request, now).is_err());
    }

    #[test]
    fn license_change_resets_verification() {
        let now = Utc::now();
        let mut profile = build_driver_profile(Uuid::new_v4(), &driver_request(now), now).unwrap();
        profile.license_verified = true;

        let same = UpdateDriverProfileRequest {
            license_number: Some(profile.license_number.clone()),
            ..Default::default()
        };
        assert!(!apply_driver_update(&mut profile, &same, now).unwrap());
        assert!(profile.license_verified);

        let changed = UpdateDriverProfileRequest {
            license_number: Some("MH-1234".to_string()),
            ..Default::default()
        };
        assert!(apply_driver_update(&mut profile, &changed, now).unwrap());
        assert!(!profile.license_verified);
        assert_eq!(profile.license_number, "MH-1234");
    }

    // ==================== Rider Profile Tests ====================

    fn rider_request() -> RiderProfileRequest {
        RiderProfileRequest {
            route_preferences: crate::route::RoutePreferencesInput {
                start_latitude: 19.076,
                start_longitude: 72.8777,
                start_address: "Andheri".to_string(),
                end_latitude: 19.1136,
                end_longitude: 72.8697,
                end_address: "Powai".to_string(),
                preferred_start_times: vec!["09:15".to_string()],
                is_active: true,
            },
            gender_preference: None,
            vehicle_type_preferences: vec![VehicleType::Car, VehicleType::Car],
            favorite_drivers: vec![],
        }
    }

    #[test]
    fn rider_profile_defaults_and_dedups() {
        let rider = build_rider_profile(Uuid::new_v4(), &rider_request(), Utc::now()).unwrap();
        assert_eq!(rider.gender_preference, GenderPreference::NoPreference);
        assert_eq!(rider.vehicle_type_preferences, vec![VehicleType::Car]);
    }

    #[test]
    fn rider_cannot_favorite_themselves() {
        let rider_id = Uuid::new_v4();
        let mut request = rider_request();
        request.favorite_drivers = vec![rider_id];
        assert!(build_rider_profile(rider_id, &request, Utc::now()).is_err());
    }

    #[test]
    fn add_unique_and_remove_item() {
        let mut items = vec![1, 2];
        assert!(!add_unique(&mut items, 2));
        assert!(add_unique(&mut items, 3));
        assert_eq!(items, vec![1, 2, 3]);
        assert!(remove_item(&mut items, &1));
        assert!(!remove_item(&mut items, &9));
        assert_eq!(items, vec![2, 3]);
    }
}
