use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::serde::deserialize_optional_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContactRequest {
    pub name: String,
    pub phone_number: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilySharingRequest {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub email: Option<String>,
    #[serde(default)]
    pub receive_ride_updates: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSosRequest {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub ride_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveSosRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationShareRequest {
    #[serde(default)]
    pub ride_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdateRequest {
    pub latitude: f64,
    pub longitude: f64,
}
