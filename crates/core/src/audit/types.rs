use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventType {
    Registration,
    Login,
    FailedOtpVerification,
    AccountLocked,
    SuspiciousActivity,
    SessionRevoked,
    AllSessionsRevoked,
    DeviceSessionsRevoked,
    EmailVerified,
    EmailChangeInitiated,
    EmailChanged,
    EmailRemoved,
    SosTriggered,
}

impl SecurityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "REGISTRATION",
            Self::Login => "LOGIN",
            Self::FailedOtpVerification => "FAILED_OTP_VERIFICATION",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
            Self::SessionRevoked => "SESSION_REVOKED",
            Self::AllSessionsRevoked => "ALL_SESSIONS_REVOKED",
            Self::DeviceSessionsRevoked => "DEVICE_SESSIONS_REVOKED",
            Self::EmailVerified => "EMAIL_VERIFIED",
            Self::EmailChangeInitiated => "EMAIL_CHANGE_INITIATED",
            Self::EmailChanged => "EMAIL_CHANGED",
            Self::EmailRemoved => "EMAIL_REMOVED",
            Self::SosTriggered => "SOS_TRIGGERED",
        }
    }
}

impl std::fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SecurityEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let event = match s {
            "REGISTRATION" => Self::Registration,
            "LOGIN" => Self::Login,
            "FAILED_OTP_VERIFICATION" => Self::FailedOtpVerification,
            "ACCOUNT_LOCKED" => Self::AccountLocked,
            "SUSPICIOUS_ACTIVITY" => Self::SuspiciousActivity,
            "SESSION_REVOKED" => Self::SessionRevoked,
            "ALL_SESSIONS_REVOKED" => Self::AllSessionsRevoked,
            "DEVICE_SESSIONS_REVOKED" => Self::DeviceSessionsRevoked,
            "EMAIL_VERIFIED" => Self::EmailVerified,
            "EMAIL_CHANGE_INITIATED" => Self::EmailChangeInitiated,
            "EMAIL_CHANGED" => Self::EmailChanged,
            "EMAIL_REMOVED" => Self::EmailRemoved,
            "SOS_TRIGGERED" => Self::SosTriggered,
            other => return Err(format!("unknown security event type: {}", other)),
        };
        Ok(event)
    }
}

/// A persisted security-relevant occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(
        user_id: Option<Uuid>,
        event_type: SecurityEventType,
        severity: Severity,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id,
            event_type,
            severity,
            description: description.into(),
            created_at: now,
        }
    }
}

/// Kind of change recorded in the entity audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    BulkUpdate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::BulkUpdate => "BULK_UPDATE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "BULK_UPDATE" => Ok(Self::BulkUpdate),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

/// One change to a user-owned entity.
///
/// `field_name`, `old_value` and `new_value` are set for single-field
/// changes. Values never carry secrets or full payment identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    pub audit_id: Uuid,
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        user_id: Uuid,
        entity_type: impl Into<String>,
        entity_id: Uuid,
        action: AuditAction,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            user_id,
            entity_type: entity_type.into(),
            entity_id,
            action,
            field_name: None,
            old_value: None,
            new_value: None,
            reason: None,
            created_at: now,
        }
    }

    pub fn with_change(
        mut self,
        field_name: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field_name = Some(field_name.into());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_impact() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn event_type_parses_its_own_representation() {
        let parsed: SecurityEventType = SecurityEventType::EmailChanged.as_str().parse().unwrap();
        assert_eq!(parsed, SecurityEventType::EmailChanged);
    }

    #[test]
    fn audit_action_parses_its_own_representation() {
        for action in [
            AuditAction::Create,
            AuditAction::Update,
            AuditAction::Delete,
            AuditAction::BulkUpdate,
        ] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert!("MERGE".parse::<AuditAction>().is_err());
    }

    #[test]
    fn field_change_keeps_both_values() {
        let user_id = Uuid::new_v4();
        let log = AuditLog::new(user_id, "Wallet", Uuid::new_v4(), AuditAction::Update, Utc::now())
            .with_change("balance", Some("0.00".into()), Some("50.00".into()))
            .with_reason("Funds added");

        assert_eq!(log.field_name.as_deref(), Some("balance"));
        assert_eq!(log.old_value.as_deref(), Some("0.00"));
        assert_eq!(log.new_value.as_deref(), Some("50.00"));
        assert_eq!(log.reason.as_deref(), Some("Funds added"));
    }
}
