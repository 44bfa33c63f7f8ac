use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Permission;

/// Cryptographically random session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const UNKNOWN: &str = "UNKNOWN";

/// Client device a session was opened from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub device_id: String,
    pub app_version: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_type: UNKNOWN.to_string(),
            device_id: UNKNOWN.to_string(),
            app_version: UNKNOWN.to_string(),
        }
    }
}

impl DeviceInfo {
    /// Builds device info from optional client-supplied values, defaulting
    /// missing or blank fields to `UNKNOWN`.
    pub fn from_parts(
        device_type: Option<String>,
        device_id: Option<String>,
        app_version: Option<String>,
    ) -> Self {
        let or_unknown = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        Self {
            device_type: or_unknown(device_type),
            device_id: or_unknown(device_id),
            app_version: or_unknown(app_version),
        }
    }
}

/// Server-side session backing a pair of issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub session_id: SessionId,
    pub user_id: Uuid,
    pub device: DeviceInfo,
    pub permissions: Vec<Permission>,
    pub mobile_verified: bool,
    pub email_verified: bool,
    /// `jti` of the refresh token issued with this session.
    pub refresh_token_id: String,
    pub created_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why a session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEndReason {
    UserLogout,
    SecurityEvent,
    DeviceRevoked,
    Expired,
    Inactive,
}

impl SessionEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserLogout => "USER_LOGOUT",
            Self::SecurityEvent => "SECURITY_EVENT",
            Self::DeviceRevoked => "DEVICE_REVOKED",
            Self::Expired => "EXPIRED",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionEndReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER_LOGOUT" => Ok(Self::UserLogout),
            "SECURITY_EVENT" => Ok(Self::SecurityEvent),
            "DEVICE_REVOKED" => Ok(Self::DeviceRevoked),
            "EXPIRED" => Ok(Self::Expired),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(format!("unknown session end reason: {}", other)),
        }
    }
}

/// Durable record of a session, kept after the session itself is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: SessionId,
    pub user_id: Uuid,
    pub device: DeviceInfo,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<SessionEndReason>,
}

impl SessionMetadata {
    pub fn for_session(session: &UserSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            user_id: session.user_id,
            device: session.device.clone(),
            created_at: session.created_at,
            last_activity_at: session.last_access_at,
            ended_at: None,
            end_reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn end(&mut self, reason: SessionEndReason, at: DateTime<Utc>) {
        self.ended_at = Some(at);
        self.end_reason = Some(reason);
    }
}

/// Hashed one-time password awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub otp_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub verified: bool,
}

/// Result of checking a candidate code against an [`OtpRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    AlreadyUsed,
    Expired,
    AttemptsExhausted,
    /// Wrong code; `remaining` counts the attempts left after this one.
    Mismatch { remaining: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_defaults_missing_fields_to_unknown() {
        let device = DeviceInfo::from_parts(Some("ANDROID".to_string()), None, Some("  ".to_string()));
        assert_eq!(device.device_type, "ANDROID");
        assert_eq!(device.device_id, "UNKNOWN");
        assert_eq!(device.app_version, "UNKNOWN");
    }

    #[test]
    fn session_end_reason_round_trips_through_str() {
        let reason: SessionEndReason = "DEVICE_REVOKED".parse().unwrap();
        assert_eq!(reason, SessionEndReason::DeviceRevoked);
        assert_eq!(reason.to_string(), "DEVICE_REVOKED");
    }

    #[test]
    fn metadata_end_records_reason() {
        let now = Utc::now();
        let mut metadata = SessionMetadata {
            session_id: SessionId::new("abc".to_string()),
            user_id: Uuid::new_v4(),
            device: DeviceInfo::default(),
            created_at: now,
            last_activity_at: now,
            ended_at: None,
            end_reason: None,
        };
        assert!(metadata.is_open());
        metadata.end(SessionEndReason::UserLogout, now);
        assert!(!metadata.is_open());
        assert_eq!(metadata.end_reason, Some(SessionEndReason::UserLogout));
    }
}
