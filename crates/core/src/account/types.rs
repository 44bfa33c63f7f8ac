use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountError;

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    /// Phone registered, corporate email not yet verified.
    PendingEmail,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::PendingEmail => "PENDING_EMAIL",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            "PENDING_EMAIL" => Ok(Self::PendingEmail),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// A registered user, identified by an E.164 phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: Uuid,
    pub phone_number: String,
    pub phone_verified: bool,
    pub corporate_email: Option<String>,
    pub email_verified: bool,
    pub account_status: AccountStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Creates a freshly registered account awaiting phone and email verification.
    pub fn new(phone_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            phone_number: phone_number.into(),
            phone_verified: false,
            corporate_email: None,
            email_verified: false,
            account_status: AccountStatus::PendingEmail,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verify_phone(&mut self, now: DateTime<Utc>) {
        self.phone_verified = true;
        self.updated_at = now;
    }

    /// Attaches a verified corporate email and activates a pending account
    /// whose phone is already verified.
    pub fn verify_email(&mut self, email: impl Into<String>, now: DateTime<Utc>) {
        self.corporate_email = Some(email.into());
        self.email_verified = true;
        if self.phone_verified && self.account_status == AccountStatus::PendingEmail {
            self.account_status = AccountStatus::Active;
        }
        self.updated_at = now;
    }

    pub fn clear_email(&mut self, now: DateTime<Utc>) {
        self.corporate_email = None;
        self.email_verified = false;
        self.updated_at = now;
    }

    pub fn is_fully_verified(&self) -> bool {
        self.phone_verified && self.email_verified
    }

    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }

    pub fn is_suspended(&self) -> bool {
        self.account_status == AccountStatus::Suspended
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) {
        self.account_status = AccountStatus::Suspended;
        self.updated_at = now;
    }

    pub fn reactivate(&mut self, now: DateTime<Utc>) -> Result<(), AccountError> {
        if !self.is_fully_verified() {
            return Err(AccountError::NotFullyVerified);
        }
        self.account_status = AccountStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount::new("+919876543210", Utc::now())
    }

    #[test]
    fn new_account_is_pending_email() {
        let account = account();
        assert_eq!(account.account_status, AccountStatus::PendingEmail);
        assert!(!account.phone_verified);
        assert!(!account.is_fully_verified());
    }

    #[test]
    fn verify_email_activates_when_phone_verified() {
        let mut account = account();
        account.verify_phone(Utc::now());
        account.verify_email("jane@acme.com", Utc::now());
        assert!(account.is_fully_verified());
        assert!(account.is_active());
        assert_eq!(account.corporate_email.as_deref(), Some("jane@acme.com"));
    }

    #[test]
    fn verify_email_without_phone_stays_pending() {
        let mut account = account();
        account.verify_email("jane@acme.com", Utc::now());
        assert_eq!(account.account_status, AccountStatus::PendingEmail);
    }

    #[test]
    fn verify_email_does_not_reactivate_suspended_account() {
        let mut account = account();
        account.verify_phone(Utc::now());
        account.suspend(Utc::now());
        account.verify_email("jane@acme.com", Utc::now());
        assert!(account.is_suspended());
    }

    #[test]
    fn clear_email_removes_verification() {
        let mut account = account();
        account.verify_phone(Utc::now());
        account.verify_email("jane@acme.com", Utc::now());
        account.clear_email(Utc::now());
        assert!(account.corporate_email.is_none());
        assert!(!account.email_verified);
    }

    #[test]
    fn reactivate_requires_full_verification() {
        let mut account = account();
        account.suspend(Utc::now());
        assert_eq!(
            account.reactivate(Utc::now()),
            Err(AccountError::NotFullyVerified)
        );

        account.verify_phone(Utc::now());
        account.verify_email("jane@acme.com", Utc::now());
        account.reactivate(Utc::now()).unwrap();
        assert!(account.is_active());
    }

    #[test]
    fn account_status_parses_from_string() {
        assert_eq!("PENDING_EMAIL".parse(), Ok(AccountStatus::PendingEmail));
        assert!("pending".parse::<AccountStatus>().is_err());
    }
}
