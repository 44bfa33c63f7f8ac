//! In-memory key-value store for development and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use officemate_core::auth::{
    CounterStore, OtpRecord, OtpRepository, Result, SessionId, SessionRepository, UserSession,
};

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    fn new(value: T, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-memory store for sessions, OTPs and rate-limit counters.
///
/// Entries carry their own expiry and are treated as absent once it passes,
/// mirroring Redis TTL semantics. Every write drops the expired entries of
/// the map it touches, so memory is bounded by what is live. Data is lost
/// when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Expiring<UserSession>>>>,
    user_sessions: Arc<RwLock<HashMap<Uuid, HashSet<String>>>>,
    revoked_tokens: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    otps: Arc<RwLock<HashMap<String, Expiring<OtpRecord>>>>,
    counters: Arc<RwLock<HashMap<String, Expiring<u64>>>>,
    flags: Arc<RwLock<HashMap<String, Expiring<String>>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn prune<T>(entries: &mut HashMap<String, Expiring<T>>, now: DateTime<Utc>) {
    entries.retain(|_, e| e.is_live(now));
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, session: &UserSession) -> Result<()> {
        let id = session.session_id.as_str().to_string();
        let mut sessions = self.sessions.write().await;
        prune(&mut *sessions, Utc::now());
        sessions.insert(id.clone(), Expiring::new(session.clone(), session.expires_at));

        let mut index = self.user_sessions.write().await;
        index.retain(|_, ids| {
            ids.retain(|id| sessions.contains_key(id));
            !ids.is_empty()
        });
        index.entry(session.user_id).or_default().insert(id);
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<UserSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id.as_str())
            .filter(|e| e.is_live(Utc::now()))
            .map(|e| e.value.clone()))
    }

    async fn update_session(&self, session: &UserSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(session.session_id.as_str()) {
            entry.value = session.clone();
        }
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let removed = self.sessions.write().await.remove(id.as_str());
        if let Some(entry) = removed {
            let mut index = self.user_sessions.write().await;
            if let Some(ids) = index.get_mut(&entry.value.user_id) {
                ids.remove(id.as_str());
                if ids.is_empty() {
                    index.remove(&entry.value.user_id);
                }
            }
        }
        Ok(())
    }

    async fn user_sessions(&self, user_id: Uuid) -> Result<Vec<UserSession>> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        let mut index = self.user_sessions.write().await;

        let Some(ids) = index.get_mut(&user_id) else {
            return Ok(Vec::new());
        };

        ids.retain(|id| sessions.get(id).is_some_and(|e| e.is_live(now)));

        let mut live: Vec<UserSession> = ids
            .iter()
            .filter_map(|id| sessions.get(id).map(|e| e.value.clone()))
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }

    async fn revoke_token(&self, token_id: &str, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let mut revoked = self.revoked_tokens.write().await;
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(token_id.to_string(), now + ttl);
        Ok(())
    }

    async fn is_token_revoked(&self, token_id: &str) -> Result<bool> {
        let revoked = self.revoked_tokens.read().await;
        Ok(revoked
            .get(token_id)
            .is_some_and(|expires_at| *expires_at > Utc::now()))
    }
}

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn store_otp(&self, key: &str, record: &OtpRecord, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let mut otps = self.otps.write().await;
        prune(&mut *otps, now);
        otps.insert(key.to_string(), Expiring::new(record.clone(), now + ttl));
        Ok(())
    }

    async fn get_otp(&self, key: &str) -> Result<Option<OtpRecord>> {
        let otps = self.otps.read().await;
        Ok(otps
            .get(key)
            .filter(|e| e.is_live(Utc::now()))
            .map(|e| e.value.clone()))
    }

    async fn update_otp(&self, key: &str, record: &OtpRecord) -> Result<()> {
        if let Some(entry) = self.otps.write().await.get_mut(key) {
            entry.value = record.clone();
        }
        Ok(())
    }

    async fn delete_otp(&self, key: &str) -> Result<()> {
        self.otps.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let now = Utc::now();
        let mut counters = self.counters.write().await;
        prune(&mut *counters, now);
        let entry = counters
            .entry(key.to_string())
            .and_modify(|e| {
                if !e.is_live(now) {
                    *e = Expiring::new(0, now + window);
                }
            })
            .or_insert_with(|| Expiring::new(0, now + window));
        entry.value += 1;
        Ok(entry.value)
    }

    async fn count(&self, key: &str) -> Result<u64> {
        let counters = self.counters.read().await;
        Ok(counters
            .get(key)
            .filter(|e| e.is_live(Utc::now()))
            .map(|e| e.value)
            .unwrap_or(0))
    }

    async fn set_flag(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let mut flags = self.flags.write().await;
        prune(&mut *flags, now);
        flags.insert(key.to_string(), Expiring::new(value.to_string(), now + ttl));
        Ok(())
    }

    async fn get_flag(&self, key: &str) -> Result<Option<String>> {
        let flags = self.flags.read().await;
        Ok(flags
            .get(key)
            .filter(|e| e.is_live(Utc::now()))
            .map(|e| e.value.clone()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.counters.write().await.remove(key);
        self.flags.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officemate_core::auth::{generate_session_id, hash_otp, DeviceInfo};

    fn create_test_session(user_id: Uuid, ttl: Duration) -> UserSession {
        let now = Utc::now();
        UserSession {
            session_id: generate_session_id(),
            user_id,
            device: DeviceInfo::default(),
            permissions: Vec::new(),
            mobile_verified: true,
            email_verified: false,
            refresh_token_id: Uuid::new_v4().to_string(),
            created_at: now,
            last_access_at: now,
            expires_at: now + ttl,
        }
    }

    fn create_test_otp() -> OtpRecord {
        let now = Utc::now();
        OtpRecord {
            otp_hash: hash_otp("123456"),
            created_at: now,
            expires_at: now + Duration::minutes(5),
            attempts: 0,
            verified: false,
        }
    }

    // ==================== Session Tests ====================

    #[tokio::test]
    async fn test_session_create_and_get() {
        let store = MemoryStore::new();
        let session = create_test_session(Uuid::new_v4(), Duration::hours(1));

        store.create_session(&session).await.unwrap();

        let retrieved = store.get_session(&session.session_id).await.unwrap();
        assert_eq!(retrieved, Some(session));
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let store = MemoryStore::new();
        let session = create_test_session(Uuid::new_v4(), Duration::seconds(-1));

        store.create_session(&session).await.unwrap();

        assert!(store.get_session(&session.session_id).await.unwrap().is_none());
        assert!(store.user_sessions(session.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_session_keeps_expiry() {
        let store = MemoryStore::new();
        let mut session = create_test_session(Uuid::new_v4(), Duration::hours(1));
        store.create_session(&session).await.unwrap();

        session.email_verified = true;
        store.update_session(&session).await.unwrap();

        let retrieved = store.get_session(&session.session_id).await.unwrap().unwrap();
        assert!(retrieved.email_verified);
    }

    #[tokio::test]
    async fn test_user_sessions_lists_only_own_sessions() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first = create_test_session(user, Duration::hours(1));
        let second = create_test_session(user, Duration::hours(1));
        let other = create_test_session(Uuid::new_v4(), Duration::hours(1));

        for session in [&first, &second, &other] {
            store.create_session(session).await.unwrap();
        }
        store.delete_session(&first.session_id).await.unwrap();

        let sessions = store.user_sessions(user).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_session() {
        let store = MemoryStore::new();

        // Should not error when deleting nonexistent session
        let result = store
            .delete_session(&SessionId::new("nonexistent".to_string()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_tokens_expire() {
        let store = MemoryStore::new();

        store.revoke_token("jti-1", Duration::hours(1)).await.unwrap();
        store.revoke_token("jti-2", Duration::seconds(-1)).await.unwrap();

        assert!(store.is_token_revoked("jti-1").await.unwrap());
        assert!(!store.is_token_revoked("jti-2").await.unwrap());
        assert!(!store.is_token_revoked("jti-3").await.unwrap());
    }

    // ==================== OTP Tests ====================

    #[tokio::test]
    async fn test_otp_store_update_delete() {
        let store = MemoryStore::new();
        let mut record = create_test_otp();

        store
            .store_otp("otp:phone:+919876543210", &record, Duration::minutes(5))
            .await
            .unwrap();

        record.attempts = 2;
        store
            .update_otp("otp:phone:+919876543210", &record)
            .await
            .unwrap();
        let retrieved = store.get_otp("otp:phone:+919876543210").await.unwrap();
        assert_eq!(retrieved.map(|r| r.attempts), Some(2));

        store.delete_otp("otp:phone:+919876543210").await.unwrap();
        assert!(store
            .get_otp("otp:phone:+919876543210")
            .await
            .unwrap()
            .is_none());
    }

    // ==================== Counter Tests ====================

    #[tokio::test]
    async fn test_increment_counts_within_window() {
        let store = MemoryStore::new();

        assert_eq!(store.increment("k", Duration::hours(1)).await.unwrap(), 1);
        assert_eq!(store.increment("k", Duration::hours(1)).await.unwrap(), 2);
        assert_eq!(store.count("k").await.unwrap(), 2);
        assert_eq!(store.count("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_writes_drop_expired_entries() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        for _ in 0..3 {
            store
                .create_session(&create_test_session(user_id, Duration::seconds(-1)))
                .await
                .unwrap();
            store
                .store_otp("stale", &create_test_otp(), Duration::seconds(-1))
                .await
                .unwrap();
            store.revoke_token("old", Duration::seconds(-1)).await.unwrap();
            store.set_flag("old", "1", Duration::seconds(-1)).await.unwrap();
        }

        let live = create_test_session(Uuid::new_v4(), Duration::hours(1));
        store.create_session(&live).await.unwrap();
        store
            .store_otp("fresh", &create_test_otp(), Duration::minutes(5))
            .await
            .unwrap();
        store.revoke_token("new", Duration::hours(1)).await.unwrap();
        store.set_flag("new", "1", Duration::hours(1)).await.unwrap();

        assert_eq!(store.sessions.read().await.len(), 1);
        assert!(!store.user_sessions.read().await.contains_key(&user_id));
        assert_eq!(store.otps.read().await.len(), 1);
        assert_eq!(store.revoked_tokens.read().await.len(), 1);
        assert_eq!(store.flags.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let store = MemoryStore::new();

        store.increment("k", Duration::seconds(-1)).await.unwrap();
        assert_eq!(store.count("k").await.unwrap(), 0);
        assert_eq!(store.increment("k", Duration::hours(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_flags_and_remove() {
        let store = MemoryStore::new();

        store
            .set_flag("lock", "until", Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(
            store.get_flag("lock").await.unwrap(),
            Some("until".to_string())
        );

        store.remove("lock").await.unwrap();
        assert!(store.get_flag("lock").await.unwrap().is_none());
    }
}
