//! Session lifecycle: issuing, validating, refreshing and revoking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::auth::{
    calculate_expiry, generate_session_id, generate_token_id, is_session_expired,
    permissions_for, remaining_ttl, AccessClaims, AuthError as CoreError, DeviceInfo,
    SessionEndReason, SessionId, SessionMetadata, SessionRepository, UserSession,
};
use officemate_core::storage::{AccountRepository, SessionMetadataRepository};

use crate::error::AuthError;
use crate::tokens::TokenService;

/// Tokens handed to a client when a session opens.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// A new access token minted from a refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Coordinates the session cache, durable metadata and token signing.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    metadata: Arc<dyn SessionMetadataRepository>,
    accounts: Arc<dyn AccountRepository>,
    tokens: TokenService,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        metadata: Arc<dyn SessionMetadataRepository>,
        accounts: Arc<dyn AccountRepository>,
        tokens: TokenService,
    ) -> Self {
        Self {
            sessions,
            metadata,
            accounts,
            tokens,
        }
    }

    /// Opens a session for `account` and issues its token pair.
    pub async fn create_session(
        &self,
        account: &UserAccount,
        device: DeviceInfo,
    ) -> Result<IssuedTokens, AuthError> {
        let now = Utc::now();
        let session = UserSession {
            session_id: generate_session_id(),
            user_id: account.user_id,
            device,
            permissions: permissions_for(
                account.phone_verified,
                account.email_verified,
                account.account_status,
            ),
            mobile_verified: account.phone_verified,
            email_verified: account.email_verified,
            refresh_token_id: generate_token_id(),
            created_at: now,
            last_access_at: now,
            expires_at: calculate_expiry(now, self.tokens.refresh_ttl()),
        };

        self.sessions.create_session(&session).await?;
        self.metadata
            .save_metadata(&SessionMetadata::for_session(&session))
            .await?;

        let (access_token, claims) =
            self.tokens
                .issue_access_token(&session, account.account_status, now)?;
        let refresh_token = self.tokens.issue_refresh_token(&session, now)?;

        tracing::info!(
            user_id = %account.user_id,
            session_id = %session.session_id,
            device_type = %session.device.device_type,
            "Session created"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            session_id: session.session_id.to_string(),
            user_id: account.user_id,
            expires_at: timestamp(claims.exp),
            refresh_expires_at: session.expires_at,
        })
    }

    /// Verifies an access token against its live session and records the access.
    pub async fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims = self.tokens.decode_access_token(token)?;
        let session_id = SessionId::new(claims.session_id.clone());

        let mut session = self
            .sessions
            .get_session(&session_id)
            .await?
            .ok_or(CoreError::SessionNotFound)?;

        let now = Utc::now();
        if is_session_expired(&session, now) {
            return Err(CoreError::SessionExpired.into());
        }

        session.last_access_at = now;
        self.sessions.update_session(&session).await?;

        Ok(claims)
    }

    /// Mints a new access token from a refresh token, re-reading the account
    /// so verification changes since login are reflected.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError> {
        let claims = self.tokens.decode_refresh_token(refresh_token)?;

        if self.sessions.is_token_revoked(&claims.jti).await? {
            return Err(CoreError::TokenRevoked.into());
        }

        let session_id = SessionId::new(claims.session_id.clone());
        let mut session = self
            .sessions
            .get_session(&session_id)
            .await?
            .ok_or(CoreError::SessionNotFound)?;

        if session.refresh_token_id != claims.jti {
            return Err(CoreError::TokenRevoked.into());
        }

        let account = self
            .accounts
            .get_account(session.user_id)
            .await?
            .ok_or(CoreError::SessionNotFound)?;

        if account.is_suspended() {
            self.revoke_session(&session_id, SessionEndReason::SecurityEvent)
                .await?;
            return Err(CoreError::AccountSuspended.into());
        }

        let now = Utc::now();
        session.mobile_verified = account.phone_verified;
        session.email_verified = account.email_verified;
        session.permissions = permissions_for(
            account.phone_verified,
            account.email_verified,
            account.account_status,
        );
        session.last_access_at = now;
        self.sessions.update_session(&session).await?;

        let mut metadata = SessionMetadata::for_session(&session);
        metadata.last_activity_at = now;
        self.metadata.save_metadata(&metadata).await?;

        let (access_token, access) =
            self.tokens
                .issue_access_token(&session, account.account_status, now)?;

        tracing::debug!(user_id = %session.user_id, session_id = %session_id, "Session refreshed");

        Ok(RefreshedToken {
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_at: timestamp(access.exp),
        })
    }

    /// Ends a session and blocks its refresh token. Returns false when the
    /// session was already gone.
    pub async fn revoke_session(
        &self,
        session_id: &SessionId,
        reason: SessionEndReason,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let Some(session) = self.sessions.get_session(session_id).await? else {
            self.metadata
                .end_session(session_id.as_str(), reason, now)
                .await?;
            return Ok(false);
        };

        self.sessions
            .revoke_token(
                &session.refresh_token_id,
                remaining_ttl(session.expires_at, now),
            )
            .await?;
        self.sessions.delete_session(session_id).await?;
        self.metadata
            .end_session(session_id.as_str(), reason, now)
            .await?;

        tracing::info!(
            user_id = %session.user_id,
            session_id = %session_id,
            reason = reason.as_str(),
            "Session revoked"
        );
        Ok(true)
    }

    /// Revokes one of `user_id`'s sessions; other users' sessions are reported as not found.
    pub async fn revoke_user_session(
        &self,
        user_id: Uuid,
        session_id: &SessionId,
        reason: SessionEndReason,
    ) -> Result<(), AuthError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(CoreError::SessionNotFound)?;

        self.revoke_session(&session.session_id, reason).await?;
        Ok(())
    }

    /// Revokes every session of a user. Returns how many were ended.
    pub async fn revoke_all_sessions(
        &self,
        user_id: Uuid,
        reason: SessionEndReason,
    ) -> Result<usize, AuthError> {
        let mut revoked = 0;
        for session in self.sessions.user_sessions(user_id).await? {
            if self.revoke_session(&session.session_id, reason).await? {
                revoked += 1;
            }
        }
        tracing::info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Revokes the user's sessions opened from one device.
    pub async fn revoke_device_sessions(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> Result<usize, AuthError> {
        let mut revoked = 0;
        for session in self.sessions.user_sessions(user_id).await? {
            if session.device.device_id == device_id
                && self
                    .revoke_session(&session.session_id, SessionEndReason::DeviceRevoked)
                    .await?
            {
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    pub async fn user_sessions(&self, user_id: Uuid) -> Result<Vec<UserSession>, AuthError> {
        Ok(self.sessions.user_sessions(user_id).await?)
    }

    pub async fn active_session_count(&self, user_id: Uuid) -> Result<usize, AuthError> {
        Ok(self.sessions.user_sessions(user_id).await?.len())
    }

    /// Every session the user ever opened, newest first.
    pub async fn session_history(&self, user_id: Uuid) -> Result<Vec<SessionMetadata>, AuthError> {
        Ok(self.metadata.list_for_user(user_id).await?)
    }

    /// Closes metadata for sessions whose cache entry has expired.
    pub async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        let mut cleaned = 0;
        for metadata in self.metadata.list_open().await? {
            let live = self
                .sessions
                .get_session(&metadata.session_id)
                .await?
                .is_some_and(|s| !is_session_expired(&s, now));
            if !live
                && self
                    .metadata
                    .end_session(metadata.session_id.as_str(), SessionEndReason::Expired, now)
                    .await?
            {
                cleaned += 1;
            }
        }
        Ok(cleaned)
    }

    /// Revokes sessions with no access since `cutoff`.
    pub async fn cleanup_inactive_sessions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, AuthError> {
        let mut cleaned = 0;
        for metadata in self.metadata.list_open().await? {
            let last_access = match self.sessions.get_session(&metadata.session_id).await? {
                Some(session) => session.last_access_at,
                None => metadata.last_activity_at,
            };
            if last_access < cutoff
                && self
                    .revoke_session(&metadata.session_id, SessionEndReason::Inactive)
                    .await?
            {
                cleaned += 1;
            }
        }
        Ok(cleaned)
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::test_support::{harness, Harness};

    async fn account(harness: &Harness, phone: &str) -> UserAccount {
        let mut account = UserAccount::new(phone.to_string(), Utc::now());
        account.verify_phone(Utc::now());
        harness.accounts.create_account(&account).await.unwrap();
        account
    }

    fn device(id: &str) -> DeviceInfo {
        DeviceInfo::from_parts(Some("ANDROID".into()), Some(id.into()), Some("1.0.0".into()))
    }

    #[tokio::test]
    async fn test_create_session_issues_valid_access_token() {
        let harness = harness();
        let account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;

        let tokens = manager.create_session(&account, device("d1")).await.unwrap();
        let claims = manager
            .validate_access_token(&tokens.access_token)
            .await
            .unwrap();

        assert_eq!(claims.user_id, account.user_id);
        assert_eq!(claims.session_id, tokens.session_id);
        assert_eq!(manager.active_session_count(account.user_id).await.unwrap(), 1);
        assert!(tokens.refresh_expires_at > tokens.expires_at);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_email_verification() {
        let harness = harness();
        let mut account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        let tokens = manager.create_session(&account, device("d1")).await.unwrap();

        account.email_verified = true;
        harness.accounts.update_account(&account).await.unwrap();

        let refreshed = manager.refresh_session(&tokens.refresh_token).await.unwrap();
        let claims = manager
            .validate_access_token(&refreshed.access_token)
            .await
            .unwrap();

        assert!(claims.email_verified);
        assert_eq!(refreshed.refresh_token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_revokes_session_of_suspended_account() {
        let harness = harness();
        let mut account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        let tokens = manager.create_session(&account, device("d1")).await.unwrap();

        account.suspend(Utc::now());
        harness.accounts.update_account(&account).await.unwrap();

        let result = manager.refresh_session(&tokens.refresh_token).await;
        assert!(matches!(
            result,
            Err(AuthError::Core(CoreError::AccountSuspended))
        ));

        let history = manager.session_history(account.user_id).await.unwrap();
        assert_eq!(history[0].end_reason, Some(SessionEndReason::SecurityEvent));
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_is_rejected() {
        let harness = harness();
        let account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        let tokens = manager.create_session(&account, device("d1")).await.unwrap();

        let revoked = manager
            .revoke_session(
                &SessionId::new(tokens.session_id.clone()),
                SessionEndReason::UserLogout,
            )
            .await
            .unwrap();
        assert!(revoked);

        let result = manager.refresh_session(&tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::Core(CoreError::TokenRevoked))));

        let result = manager.validate_access_token(&tokens.access_token).await;
        assert!(matches!(
            result,
            Err(AuthError::Core(CoreError::SessionNotFound))
        ));
    }

    #[tokio::test]
    async fn test_revoke_missing_session_returns_false() {
        let harness = harness();

        let revoked = harness
            .state
            .sessions
            .revoke_session(&SessionId::new("gone".into()), SessionEndReason::UserLogout)
            .await
            .unwrap();

        assert!(!revoked);
    }

    #[tokio::test]
    async fn test_revoke_all_and_by_device() {
        let harness = harness();
        let account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        manager.create_session(&account, device("phone")).await.unwrap();
        manager.create_session(&account, device("phone")).await.unwrap();
        manager.create_session(&account, device("tablet")).await.unwrap();

        let by_device = manager
            .revoke_device_sessions(account.user_id, "phone")
            .await
            .unwrap();
        assert_eq!(by_device, 2);

        let rest = manager
            .revoke_all_sessions(account.user_id, SessionEndReason::UserLogout)
            .await
            .unwrap();
        assert_eq!(rest, 1);
        assert_eq!(manager.active_session_count(account.user_id).await.unwrap(), 0);
        assert_eq!(manager.session_history(account.user_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_revoke_user_session_rejects_foreign_session() {
        let harness = harness();
        let owner = account(&harness, "+919876543210").await;
        let other = account(&harness, "+919812345678").await;
        let manager = &harness.state.sessions;
        let tokens = manager.create_session(&owner, device("d1")).await.unwrap();

        let result = manager
            .revoke_user_session(
                other.user_id,
                &SessionId::new(tokens.session_id.clone()),
                SessionEndReason::UserLogout,
            )
            .await;

        assert!(matches!(
            result,
            Err(AuthError::Core(CoreError::SessionNotFound))
        ));
        assert_eq!(manager.active_session_count(owner.user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_inactive_sessions() {
        let harness = harness();
        let account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        manager.create_session(&account, device("d1")).await.unwrap();

        let none = manager
            .cleanup_inactive_sessions(Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(none, 0);

        let cleaned = manager
            .cleanup_inactive_sessions(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(cleaned, 1);
        assert_eq!(manager.active_session_count(account.user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired_closes_metadata_without_cache_entry() {
        let harness = harness();
        let account = account(&harness, "+919876543210").await;
        let manager = &harness.state.sessions;
        manager.create_session(&account, device("d1")).await.unwrap();

        let live = manager.cleanup_expired_sessions(Utc::now()).await.unwrap();
        assert_eq!(live, 0);

        let later = Utc::now() + Duration::days(2);
        let cleaned = manager.cleanup_expired_sessions(later).await.unwrap();
        assert_eq!(cleaned, 1);

        let history = manager.session_history(account.user_id).await.unwrap();
        assert_eq!(history[0].end_reason, Some(SessionEndReason::Expired));
    }
}
