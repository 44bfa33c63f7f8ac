use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{AccountStatus, UserAccount};
use crate::wallet::Wallet;

/// Default and upper bound for how far a driver will deviate from their route.
pub const DEFAULT_MAX_DETOUR_METERS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profile_image_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Scooter,
    Bicycle,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Motorcycle => "MOTORCYCLE",
            Self::Scooter => "SCOOTER",
            Self::Bicycle => "BICYCLE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
            Self::Scooter => "Scooter",
            Self::Bicycle => "Bicycle",
        }
    }

    /// Allowed passenger capacity, inclusive.
    pub fn capacity_range(&self) -> (u8, u8) {
        match self {
            Self::Car => (1, 7),
            Self::Motorcycle | Self::Scooter | Self::Bicycle => (1, 2),
        }
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CAR" => Ok(Self::Car),
            "MOTORCYCLE" => Ok(Self::Motorcycle),
            "SCOOTER" => Ok(Self::Scooter),
            "BICYCLE" => Ok(Self::Bicycle),
            other => Err(format!("unknown vehicle type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
    Cng,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "PETROL",
            Self::Diesel => "DIESEL",
            Self::Electric => "ELECTRIC",
            Self::Hybrid => "HYBRID",
            Self::Cng => "CNG",
        }
    }
}

impl std::str::FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PETROL" => Ok(Self::Petrol),
            "DIESEL" => Ok(Self::Diesel),
            "ELECTRIC" => Ok(Self::Electric),
            "HYBRID" => Ok(Self::Hybrid),
            "CNG" => Ok(Self::Cng),
            other => Err(format!("unknown fuel type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub capacity: u8,
    pub fuel_type: FuelType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub driver_id: Uuid,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub license_verified: bool,
    pub max_detour_meters: u32,
    pub vehicle: Vehicle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderPreference {
    FemaleOnly,
    MaleSingleFemale,
    MaleAllFemale,
    #[default]
    NoPreference,
}

impl GenderPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FemaleOnly => "FEMALE_ONLY",
            Self::MaleSingleFemale => "MALE_SINGLE_FEMALE",
            Self::MaleAllFemale => "MALE_ALL_FEMALE",
            Self::NoPreference => "NO_PREFERENCE",
        }
    }
}

impl std::str::FromStr for GenderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FEMALE_ONLY" => Ok(Self::FemaleOnly),
            "MALE_SINGLE_FEMALE" => Ok(Self::MaleSingleFemale),
            "MALE_ALL_FEMALE" => Ok(Self::MaleAllFemale),
            "NO_PREFERENCE" => Ok(Self::NoPreference),
            other => Err(format!("unknown gender preference: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderProfile {
    pub rider_id: Uuid,
    pub gender_preference: GenderPreference,
    pub vehicle_type_preferences: Vec<VehicleType>,
    pub favorite_drivers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated profile returned by the profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub corporate_email: Option<String>,
    pub profile_image_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub mobile_verified: bool,
    pub email_verified: bool,
    pub account_status: AccountStatus,
    pub is_driver: bool,
    pub is_rider: bool,
    pub can_access_ride_features: bool,
    pub has_wallet: bool,
    pub wallet_id: Option<Uuid>,
    /// Balance in minor units.
    pub wallet_balance: Option<i64>,
    pub driver_profile: Option<DriverProfile>,
    pub rider_profile: Option<RiderProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn assemble(
        profile: &UserProfile,
        account: &UserAccount,
        driver: Option<DriverProfile>,
        rider: Option<RiderProfile>,
        wallet: Option<&Wallet>,
    ) -> Self {
        Self {
            user_id: profile.user_id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone_number: account.phone_number.clone(),
            corporate_email: account.corporate_email.clone(),
            profile_image_url: profile.profile_image_url.clone(),
            date_of_birth: profile.date_of_birth,
            gender: profile.gender,
            mobile_verified: account.phone_verified,
            email_verified: account.email_verified,
            account_status: account.account_status,
            is_driver: driver.is_some(),
            is_rider: rider.is_some(),
            can_access_ride_features: account.is_fully_verified(),
            has_wallet: wallet.is_some(),
            wallet_id: wallet.map(|w| w.wallet_id),
            wallet_balance: wallet.map(|w| w.balance),
            driver_profile: driver,
            rider_profile: rider,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}
