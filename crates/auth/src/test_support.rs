//! In-memory doubles shared by the crate's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::audit::SecurityEvent;
use officemate_core::auth::{SessionEndReason, SessionMetadata};
use officemate_core::notify::{NotificationError, Result as NotifyResult, SmsSender};
use officemate_core::storage::{
    AccountRepository, RepositoryError, Result, SecurityEventRepository,
    SessionMetadataRepository,
};

use crate::config::AuthConfig;
use crate::state::{AuthState, AuthStores};
use crate::stores::MemoryStore;

pub const TEST_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

#[derive(Default)]
pub struct Accounts(RwLock<HashMap<Uuid, UserAccount>>);

#[async_trait]
impl AccountRepository for Accounts {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        Ok(self.0.read().await.get(&user_id).cloned())
    }

    async fn get_account_by_phone(&self, phone_number: &str) -> Result<Option<UserAccount>> {
        Ok(self
            .0
            .read()
            .await
            .values()
            .find(|a| a.phone_number == phone_number)
            .cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        Ok(self
            .0
            .read()
            .await
            .values()
            .find(|a| a.corporate_email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_account(&self, account: &UserAccount) -> Result<()> {
        let mut accounts = self.0.write().await;
        if accounts
            .values()
            .any(|a| a.phone_number == account.phone_number)
        {
            return Err(RepositoryError::already_exists(
                "UserAccount",
                &account.phone_number,
            ));
        }
        accounts.insert(account.user_id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &UserAccount) -> Result<()> {
        self.0.write().await.insert(account.user_id, account.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct Metadata(RwLock<HashMap<String, SessionMetadata>>);

#[async_trait]
impl SessionMetadataRepository for Metadata {
    async fn save_metadata(&self, metadata: &SessionMetadata) -> Result<()> {
        self.0
            .write()
            .await
            .insert(metadata.session_id.to_string(), metadata.clone());
        Ok(())
    }

    async fn get_metadata(&self, session_id: &str) -> Result<Option<SessionMetadata>> {
        Ok(self.0.read().await.get(session_id).cloned())
    }

    async fn end_session(
        &self,
        session_id: &str,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.0.write().await.get_mut(session_id) {
            Some(m) if m.is_open() => {
                m.end(reason, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionMetadata>> {
        let mut list: Vec<_> = self
            .0
            .read()
            .await
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list_open(&self) -> Result<Vec<SessionMetadata>> {
        Ok(self
            .0
            .read()
            .await
            .values()
            .filter(|m| m.is_open())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct Events(pub RwLock<Vec<SecurityEvent>>);

#[async_trait]
impl SecurityEventRepository for Events {
    async fn record_event(&self, event: &SecurityEvent) -> Result<()> {
        self.0.write().await.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, user_id: Uuid, limit: usize) -> Result<Vec<SecurityEvent>> {
        Ok(self
            .0
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.user_id == Some(user_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Records every SMS so tests can read back the code.
#[derive(Default)]
pub struct CapturingSms {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl CapturingSms {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn last_code(&self) -> String {
        let sent = self.sent.lock().await;
        let (_, message) = sent.last().expect("an SMS was sent");
        message
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(6)
            .collect()
    }
}

#[async_trait]
impl SmsSender for CapturingSms {
    async fn send_sms(&self, phone_number: &str, message: &str) -> NotifyResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Sms("provider unavailable".into()));
        }
        self.sent
            .lock()
            .await
            .push((phone_number.to_string(), message.to_string()));
        Ok("msg-1".to_string())
    }
}

/// Handles to the doubles behind a test [`AuthState`].
pub struct Harness {
    pub state: AuthState,
    pub accounts: Arc<Accounts>,
    pub events: Arc<Events>,
    pub sms: Arc<CapturingSms>,
    pub store: Arc<MemoryStore>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let accounts = Arc::new(Accounts::default());
    let events = Arc::new(Events::default());
    let sms = Arc::new(CapturingSms::default());

    let state = AuthState::new(
        AuthStores {
            sessions: store.clone(),
            otps: store.clone(),
            counters: store.clone(),
            session_metadata: Arc::new(Metadata::default()),
            accounts: accounts.clone(),
            security_events: events.clone(),
            sms: sms.clone(),
        },
        AuthConfig::new(TEST_SECRET),
    );

    Harness {
        state,
        accounts,
        events,
        sms,
        store,
    }
}
