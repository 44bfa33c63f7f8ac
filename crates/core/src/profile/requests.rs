//! Request payloads for the profile endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Gender, GenderPreference, Vehicle, VehicleType, DEFAULT_MAX_DETOUR_METERS};
use crate::route::RoutePreferencesInput;
use crate::serde::{deserialize_optional_date, deserialize_optional_string};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub profile_image_url: Option<String>,
}

/// Partial update; absent or blank fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub profile_image_url: Option<String>,
}

fn default_detour() -> u32 {
    DEFAULT_MAX_DETOUR_METERS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfileRequest {
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub vehicle: Vehicle,
    #[serde(default = "default_detour")]
    pub max_detour_meters: u32,
    #[serde(default)]
    pub route_preferences: Option<RoutePreferencesInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDriverProfileRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub license_number: Option<String>,
    #[serde(default)]
    pub license_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
    #[serde(default)]
    pub max_detour_meters: Option<u32>,
    #[serde(default)]
    pub route_preferences: Option<RoutePreferencesInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderProfileRequest {
    pub route_preferences: RoutePreferencesInput,
    #[serde(default)]
    pub gender_preference: Option<GenderPreference>,
    #[serde(default)]
    pub vehicle_type_preferences: Vec<VehicleType>,
    #[serde(default)]
    pub favorite_drivers: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRiderProfileRequest {
    #[serde(default)]
    pub gender_preference: Option<GenderPreference>,
    #[serde(default)]
    pub vehicle_type_preferences: Option<Vec<VehicleType>>,
    #[serde(default)]
    pub favorite_drivers: Option<Vec<Uuid>>,
    #[serde(default)]
    pub route_preferences: Option<RoutePreferencesInput>,
}
