use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of an emailed verification code.
pub const EMAIL_OTP_TTL: Duration = Duration::minutes(10);

pub const EMAIL_OTP_MAX_ATTEMPTS: u32 = 3;

/// A pending or completed corporate email verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    pub verification_id: Uuid,
    pub user_id: Uuid,
    pub corporate_email: String,
    pub otp_hash: String,
    pub attempts: u32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl EmailVerification {
    pub fn new(
        user_id: Uuid,
        corporate_email: impl Into<String>,
        otp_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            verification_id: Uuid::new_v4(),
            user_id,
            corporate_email: corporate_email.into(),
            otp_hash: otp_hash.into(),
            attempts: 0,
            verified: false,
            created_at: now,
            expires_at: now + EMAIL_OTP_TTL,
            verified_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Unverified and not yet expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.verified && !self.is_expired(now)
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.verified = true;
        self.verified_at = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Addition,
    Update,
    Removal,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "ADDITION",
            Self::Update => "UPDATE",
            Self::Removal => "REMOVAL",
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADDITION" => Ok(Self::Addition),
            "UPDATE" => Ok(Self::Update),
            "REMOVAL" => Ok(Self::Removal),
            other => Err(format!("unknown change type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Initiated,
    MobileVerified,
    EmailVerified,
    Completed,
    Failed,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::MobileVerified => "MOBILE_VERIFIED",
            Self::EmailVerified => "EMAIL_VERIFIED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for ChangeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATED" => Ok(Self::Initiated),
            "MOBILE_VERIFIED" => Ok(Self::MobileVerified),
            "EMAIL_VERIFIED" => Ok(Self::EmailVerified),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown change status: {}", other)),
        }
    }
}

/// Audit trail entry for a corporate email addition, update or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChangeAudit {
    pub audit_id: Uuid,
    pub user_id: Uuid,
    pub old_email: Option<String>,
    pub new_email: Option<String>,
    pub change_type: ChangeType,
    pub status: ChangeStatus,
    pub change_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub mobile_otp_verified: bool,
    pub email_otp_verified: bool,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailChangeAudit {
    /// Opens an audit entry after the mobile OTP has been confirmed.
    ///
    /// The change type follows from whether an email was already attached.
    pub fn mobile_verified(
        user_id: Uuid,
        old_email: Option<String>,
        new_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let change_type = match (&old_email, &new_email) {
            (_, None) => ChangeType::Removal,
            (None, Some(_)) => ChangeType::Addition,
            (Some(_), Some(_)) => ChangeType::Update,
        };
        Self {
            audit_id: Uuid::new_v4(),
            user_id,
            old_email,
            new_email,
            change_type,
            status: ChangeStatus::MobileVerified,
            change_reason: None,
            ip_address: None,
            user_agent: None,
            mobile_otp_verified: true,
            email_otp_verified: false,
            notes: None,
            changed_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self, email_verified: bool, notes: impl Into<String>, now: DateTime<Utc>) {
        if email_verified {
            self.email_otp_verified = true;
        }
        self.status = ChangeStatus::Completed;
        self.notes = Some(notes.into());
        self.updated_at = now;
    }

    /// Closes the entry without the change having happened.
    pub fn fail(&mut self, notes: impl Into<String>, now: DateTime<Utc>) {
        self.status = ChangeStatus::Failed;
        self.notes = Some(notes.into());
        self.updated_at = now;
    }
}

/// Result of sending or checking an email verification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub otp_sent: bool,
    pub verified: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub masked_email: Option<String>,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_verification_expires_after_ten_minutes() {
        let now = Utc::now();
        let verification = EmailVerification::new(Uuid::new_v4(), "a@acme.com", "hash", now);
        assert_eq!(verification.expires_at, now + Duration::minutes(10));
        assert!(verification.is_active(now));
        assert!(!verification.is_active(now + Duration::minutes(10)));
    }

    #[test]
    fn verified_record_is_not_active() {
        let now = Utc::now();
        let mut verification = EmailVerification::new(Uuid::new_v4(), "a@acme.com", "hash", now);
        verification.mark_verified(now);
        assert!(!verification.is_active(now));
        assert_eq!(verification.verified_at, Some(now));
    }

    #[test]
    fn audit_change_type_follows_emails() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let added = EmailChangeAudit::mobile_verified(user, None, Some("a@acme.com".into()), now);
        assert_eq!(added.change_type, ChangeType::Addition);
        let updated = EmailChangeAudit::mobile_verified(
            user,
            Some("a@acme.com".into()),
            Some("b@acme.com".into()),
            now,
        );
        assert_eq!(updated.change_type, ChangeType::Update);
        let removed = EmailChangeAudit::mobile_verified(user, Some("a@acme.com".into()), None, now);
        assert_eq!(removed.change_type, ChangeType::Removal);
        assert_eq!(removed.status, ChangeStatus::MobileVerified);
    }

    #[test]
    fn complete_marks_email_otp_and_notes() {
        let now = Utc::now();
        let mut audit =
            EmailChangeAudit::mobile_verified(Uuid::new_v4(), None, Some("a@acme.com".into()), now);
        audit.complete(true, "Email verified", now);
        assert_eq!(audit.status, ChangeStatus::Completed);
        assert!(audit.email_otp_verified);
        assert_eq!(audit.notes.as_deref(), Some("Email verified"));
    }

    #[test]
    fn failed_entry_is_no_longer_pending() {
        let now = Utc::now();
        let mut audit = EmailChangeAudit::mobile_verified(
            Uuid::new_v4(),
            Some("old@acme.com".into()),
            Some("new@acme.com".into()),
            now,
        );
        audit.fail("Code could not be sent", now);
        assert_eq!(audit.status, ChangeStatus::Failed);
        assert!(!audit.email_otp_verified);
        assert_eq!("FAILED".parse::<ChangeStatus>(), Ok(ChangeStatus::Failed));
    }
}
