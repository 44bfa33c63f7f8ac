//! Redis storage implementation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fred::prelude::*;
use fred::types::SetOptions;
use uuid::Uuid;

use officemate_core::auth::{
    remaining_ttl, revoked_token_key, session_key, user_sessions_key, AuthError, CounterStore,
    OtpRecord, OtpRepository, Result, SessionId, SessionRepository, UserSession,
};

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

/// Expiry in whole seconds, at least one so Redis accepts it.
fn ttl_secs(ttl: Duration) -> i64 {
    ttl.num_seconds().max(1)
}

/// Write mode for replacing a stored record: keep its expiry and skip the
/// write when the key has already expired, so an update never recreates it
/// without a TTL.
fn replace_existing() -> (Expiration, Option<SetOptions>) {
    (Expiration::KEEPTTL, Some(SetOptions::XX))
}

/// Redis-backed sessions, OTP records and counters.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Creates a new Redis store.
    ///
    /// # Arguments
    ///
    /// * `pool` - Redis connection pool
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn set_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        expiration: Expiration,
        condition: Option<SetOptions>,
    ) -> Result<()> {
        let json = serde_json::to_string(value).map_err(storage_err)?;
        self.pool
            .set::<(), _, _>(key, json, Some(expiration), condition, false)
            .await
            .map_err(storage_err)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value: Option<String> = self.pool.get(key).await.map_err(storage_err)?;
        value
            .map(|json| serde_json::from_str(&json).map_err(storage_err))
            .transpose()
    }
}

#[async_trait]
impl SessionRepository for RedisStore {
    async fn create_session(&self, session: &UserSession) -> Result<()> {
        let ttl = remaining_ttl(session.expires_at, Utc::now());
        self.set_json(
            &session_key(&session.session_id),
            session,
            Expiration::EX(ttl_secs(ttl)),
            None,
        )
        .await?;

        // Track session in user's session set
        let user_key = user_sessions_key(session.user_id);
        self.pool
            .sadd::<(), _, _>(&user_key, session.session_id.as_str())
            .await
            .map_err(storage_err)?;
        self.pool
            .expire::<(), _>(&user_key, ttl_secs(ttl), None)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<UserSession>> {
        self.get_json(&session_key(id)).await
    }

    async fn update_session(&self, session: &UserSession) -> Result<()> {
        let (expiration, condition) = replace_existing();
        self.set_json(&session_key(&session.session_id), session, expiration, condition)
            .await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        // Get session first to find user_id
        if let Some(session) = self.get_session(id).await? {
            self.pool
                .del::<(), _>(session_key(id))
                .await
                .map_err(storage_err)?;

            // Remove from user's session set
            self.pool
                .srem::<(), _, _>(user_sessions_key(session.user_id), id.as_str())
                .await
                .map_err(storage_err)?;
        }

        Ok(())
    }

    async fn user_sessions(&self, user_id: Uuid) -> Result<Vec<UserSession>> {
        let user_key = user_sessions_key(user_id);
        let ids: Vec<String> = self.pool.smembers(&user_key).await.map_err(storage_err)?;

        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            let session_id = SessionId::new(id);
            match self.get_session(&session_id).await? {
                Some(session) => sessions.push(session),
                None => {
                    // Session key expired; drop the stale index entry
                    self.pool
                        .srem::<(), _, _>(&user_key, session_id.as_str())
                        .await
                        .map_err(storage_err)?;
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn revoke_token(&self, token_id: &str, ttl: Duration) -> Result<()> {
        self.pool
            .set::<(), _, _>(
                revoked_token_key(token_id),
                "revoked",
                Some(Expiration::EX(ttl_secs(ttl))),
                None,
                false,
            )
            .await
            .map_err(storage_err)
    }

    async fn is_token_revoked(&self, token_id: &str) -> Result<bool> {
        let count: u32 = self
            .pool
            .exists(revoked_token_key(token_id))
            .await
            .map_err(storage_err)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl OtpRepository for RedisStore {
    async fn store_otp(&self, key: &str, record: &OtpRecord, ttl: Duration) -> Result<()> {
        self.set_json(key, record, Expiration::EX(ttl_secs(ttl)), None)
            .await
    }

    async fn get_otp(&self, key: &str) -> Result<Option<OtpRecord>> {
        self.get_json(key).await
    }

    async fn update_otp(&self, key: &str, record: &OtpRecord) -> Result<()> {
        let (expiration, condition) = replace_existing();
        self.set_json(key, record, expiration, condition).await
    }

    async fn delete_otp(&self, key: &str) -> Result<()> {
        self.pool.del::<(), _>(key).await.map_err(storage_err)
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let count: u64 = self.pool.incr(key).await.map_err(storage_err)?;
        if count == 1 {
            self.pool
                .expire::<(), _>(key, ttl_secs(window), None)
                .await
                .map_err(storage_err)?;
        }
        Ok(count)
    }

    async fn count(&self, key: &str) -> Result<u64> {
        let value: Option<u64> = self.pool.get(key).await.map_err(storage_err)?;
        Ok(value.unwrap_or(0))
    }

    async fn set_flag(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.pool
            .set::<(), _, _>(key, value, Some(Expiration::EX(ttl_secs(ttl))), None, false)
            .await
            .map_err(storage_err)
    }

    async fn get_flag(&self, key: &str) -> Result<Option<String>> {
        self.pool.get(key).await.map_err(storage_err)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.pool.del::<(), _>(key).await.map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_only_touch_live_keys() {
        let (expiration, condition) = replace_existing();
        assert_eq!(expiration, Expiration::KEEPTTL);
        assert_eq!(condition, Some(SetOptions::XX));
    }

    #[test]
    fn test_ttl_is_at_least_one_second() {
        assert_eq!(ttl_secs(Duration::zero()), 1);
        assert_eq!(ttl_secs(Duration::seconds(-5)), 1);
        assert_eq!(ttl_secs(Duration::minutes(2)), 120);
    }
}
