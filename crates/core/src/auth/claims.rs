//! JWT claim sets. Encoding and signing live in the auth crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Permission;
use crate::account::AccountStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "ACCESS",
            Self::Refresh => "REFRESH",
        }
    }
}

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub user_id: Uuid,
    pub session_id: String,
    pub mobile_verified: bool,
    pub email_verified: bool,
    pub account_status: AccountStatus,
    pub permissions: Vec<Permission>,
    pub token_type: TokenType,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub user_id: Uuid,
    pub session_id: String,
    pub token_type: TokenType,
}

impl AccessClaims {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
