use serde::{Deserialize, Serialize};

use crate::account::AccountStatus;

/// Capabilities embedded in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    MobileVerified,
    EmailVerified,
    FullyVerified,
    AccessRideFeatures,
    AccountActive,
}

/// Derives the permission set from an account's verification state.
///
/// Ride features are only unlocked once both the phone and the corporate
/// email are verified.
pub fn permissions_for(
    mobile_verified: bool,
    email_verified: bool,
    status: AccountStatus,
) -> Vec<Permission> {
    let mut permissions = Vec::new();
    if mobile_verified {
        permissions.push(Permission::MobileVerified);
    }
    if email_verified {
        permissions.push(Permission::EmailVerified);
    }
    if mobile_verified && email_verified {
        permissions.push(Permission::FullyVerified);
        permissions.push(Permission::AccessRideFeatures);
    }
    if status == AccountStatus::Active {
        permissions.push(Permission::AccountActive);
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_only_account_gets_mobile_permission() {
        assert_eq!(
            permissions_for(true, false, AccountStatus::PendingEmail),
            vec![Permission::MobileVerified]
        );
    }

    #[test]
    fn fully_verified_active_account_gets_everything() {
        assert_eq!(
            permissions_for(true, true, AccountStatus::Active),
            vec![
                Permission::MobileVerified,
                Permission::EmailVerified,
                Permission::FullyVerified,
                Permission::AccessRideFeatures,
                Permission::AccountActive,
            ]
        );
    }

    #[test]
    fn suspended_account_loses_active_permission() {
        let permissions = permissions_for(true, true, AccountStatus::Suspended);
        assert!(!permissions.contains(&Permission::AccountActive));
        assert!(permissions.contains(&Permission::FullyVerified));
    }

    #[test]
    fn permissions_serialize_screaming_snake_case() {
        let json = serde_json::to_string(&Permission::AccessRideFeatures).unwrap();
        assert_eq!(json, "\"ACCESS_RIDE_FEATURES\"");
    }
}
