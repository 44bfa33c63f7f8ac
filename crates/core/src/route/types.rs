use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a daily commute leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteType {
    HomeToWork,
    WorkToHome,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomeToWork => "HOME_TO_WORK",
            Self::WorkToHome => "WORK_TO_HOME",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::HomeToWork => Self::WorkToHome,
            Self::WorkToHome => Self::HomeToWork,
        }
    }
}

impl std::fmt::Display for RouteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RouteType {
    type Err = super::RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOME_TO_WORK" => Ok(Self::HomeToWork),
            "WORK_TO_HOME" => Ok(Self::WorkToHome),
            other => Err(super::RouteError::InvalidRouteType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// One commute leg for a user, keyed by `(user_id, route_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePreference {
    pub user_id: Uuid,
    pub route_type: RouteType,
    pub start: RoutePoint,
    pub end: RoutePoint,
    /// Departure times as `HH:MM`.
    pub preferred_start_times: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Client payload describing the home-to-work leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePreferencesInput {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub start_address: String,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub end_address: String,
    pub preferred_start_times: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}
