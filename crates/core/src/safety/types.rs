use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SafetyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub contact_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySharingContact {
    pub sharing_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub receive_ride_updates: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SosStatus {
    Active,
    Resolved,
    Cancelled,
}

impl SosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Resolved => "RESOLVED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for SosStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "RESOLVED" => Ok(Self::Resolved),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown SOS status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosAlert {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub status: SosStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
}

impl SosAlert {
    pub fn trigger(
        user_id: Uuid,
        ride_id: Option<Uuid>,
        latitude: f64,
        longitude: f64,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4(),
            user_id,
            ride_id,
            status: SosStatus::Active,
            latitude,
            longitude,
            message,
            created_at: now,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SosStatus::Active
    }

    pub fn resolve(
        &mut self,
        resolved_by: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), SafetyError> {
        if !self.is_active() {
            return Err(SafetyError::SosNotActive);
        }
        self.status = SosStatus::Resolved;
        self.resolved_by = Some(resolved_by);
        self.resolution_notes = notes;
        self.resolved_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SafetyError> {
        if !self.is_active() {
            return Err(SafetyError::SosNotActive);
        }
        self.status = SosStatus::Cancelled;
        self.resolved_at = Some(now);
        Ok(())
    }
}

/// A live location feed that family contacts can follow via its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationShare {
    pub share_id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub is_active: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl LocationShare {
    /// Starts a share with a fresh 32 character token.
    pub fn start(
        user_id: Uuid,
        ride_id: Option<Uuid>,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            share_id: Uuid::new_v4(),
            user_id,
            ride_id,
            is_active: true,
            current_latitude: Some(latitude),
            current_longitude: Some(longitude),
            last_location_update: Some(now),
            share_token: Uuid::new_v4().simple().to_string(),
            created_at: now,
            updated_at: now,
            ended_at: None,
        }
    }

    pub fn update_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Result<(), SafetyError> {
        if !self.is_active {
            return Err(SafetyError::LocationShareNotActive);
        }
        self.current_latitude = Some(latitude);
        self.current_longitude = Some(longitude);
        self.last_location_update = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn end(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.ended_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sos_resolve_and_cancel_require_active_alert() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let mut alert = SosAlert::trigger(user, None, 12.9, 77.6, None, now);
        alert.resolve(user, Some("Reached home".into()), now).unwrap();
        assert_eq!(alert.status, SosStatus::Resolved);
        assert_eq!(alert.resolved_by, Some(user));
        assert_eq!(alert.cancel(now), Err(SafetyError::SosNotActive));
        assert_eq!(
            alert.resolve(user, None, now),
            Err(SafetyError::SosNotActive)
        );
    }

    #[test]
    fn cancel_marks_alert_cancelled() {
        let now = Utc::now();
        let mut alert = SosAlert::trigger(Uuid::new_v4(), None, 0.0, 0.0, None, now);
        alert.cancel(now).unwrap();
        assert_eq!(alert.status, SosStatus::Cancelled);
        assert_eq!(alert.resolved_at, Some(now));
    }

    #[test]
    fn location_share_token_is_32_hex_chars() {
        let share = LocationShare::start(Uuid::new_v4(), None, 1.0, 2.0, Utc::now());
        assert_eq!(share.share_token.len(), 32);
        assert!(share.share_token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ended_share_rejects_updates() {
        let now = Utc::now();
        let mut share = LocationShare::start(Uuid::new_v4(), None, 1.0, 2.0, now);
        share.update_location(3.0, 4.0, now).unwrap();
        assert_eq!(share.current_latitude, Some(3.0));
        share.end(now);
        assert_eq!(
            share.update_location(5.0, 6.0, now),
            Err(SafetyError::LocationShareNotActive)
        );
        assert_eq!(share.ended_at, Some(now));
    }
}
