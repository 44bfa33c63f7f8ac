use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use super::{AuthError, OtpRecord, SessionId, UserSession};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Session storage abstraction.
///
/// Sessions live in a TTL-aware key-value store; implementations expire them
/// at `expires_at`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session and index it under its user.
    async fn create_session(&self, session: &UserSession) -> Result<()>;

    /// Retrieve session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<UserSession>>;

    /// Overwrite an existing session, keeping its expiry.
    async fn update_session(&self, session: &UserSession) -> Result<()>;

    /// Delete a specific session.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// All live sessions for a user. Stale index entries are pruned.
    async fn user_sessions(&self, user_id: Uuid) -> Result<Vec<UserSession>>;

    /// Mark a refresh token id as revoked until its natural expiry.
    async fn revoke_token(&self, token_id: &str, ttl: Duration) -> Result<()>;

    /// Whether a refresh token id has been revoked.
    async fn is_token_revoked(&self, token_id: &str) -> Result<bool>;
}

/// Storage for hashed one-time passwords.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Store an OTP record under `key`, replacing any previous one.
    async fn store_otp(&self, key: &str, record: &OtpRecord, ttl: Duration) -> Result<()>;

    async fn get_otp(&self, key: &str) -> Result<Option<OtpRecord>>;

    /// Overwrite a record while keeping its remaining TTL.
    async fn update_otp(&self, key: &str, record: &OtpRecord) -> Result<()>;

    async fn delete_otp(&self, key: &str) -> Result<()>;
}

/// Expiring counters and flags used for rate limiting and lockouts.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key` and return the new value. The window starts on the
    /// first increment.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64>;

    /// Current value of a counter, zero when absent.
    async fn count(&self, key: &str) -> Result<u64>;

    /// Set a flag that disappears after `ttl`.
    async fn set_flag(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get_flag(&self, key: &str) -> Result<Option<String>>;

    /// Remove a counter or flag.
    async fn remove(&self, key: &str) -> Result<()>;
}
