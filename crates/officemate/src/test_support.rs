//! Doubles and builders shared by the binary's tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use officemate_auth::{AuthConfig, AuthState, AuthStores, MemoryStore};
use officemate_core::account::UserAccount;
use officemate_core::auth::DeviceInfo;
use officemate_core::notify::{
    EmailMessage, EmailSender, NotificationError, Result as NotifyResult, SmsSender,
};
use officemate_core::storage::AccountRepository;

use crate::state::AppState;
use crate::storage::InMemoryRepository;

pub const TEST_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

/// Captures outgoing SMS and email so tests can read codes back.
#[derive(Default)]
pub struct RecordingSender {
    sms: Mutex<Vec<(String, String)>>,
    emails: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
    email_down: AtomicBool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Makes email delivery fail while SMS keeps working.
    pub fn set_email_failing(&self, failing: bool) {
        self.email_down.store(failing, Ordering::SeqCst);
    }

    pub async fn sms(&self) -> Vec<(String, String)> {
        self.sms.lock().await.clone()
    }

    pub async fn emails(&self) -> Vec<EmailMessage> {
        self.emails.lock().await.clone()
    }

    pub async fn last_sms_code(&self, phone_number: &str) -> String {
        let sent = self.sms.lock().await;
        let (_, message) = sent
            .iter()
            .rev()
            .find(|(to, _)| to == phone_number)
            .expect("an SMS was sent");
        first_code(message)
    }

    pub async fn last_email_code(&self, to: &str) -> String {
        let sent = self.emails.lock().await;
        let message = sent
            .iter()
            .rev()
            .find(|m| m.to == to)
            .expect("an email was sent");
        first_code(&message.body)
    }
}

fn first_code(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 6)
        .expect("a six digit code")
        .to_string()
}

#[async_trait]
impl SmsSender for RecordingSender {
    async fn send_sms(&self, phone_number: &str, message: &str) -> NotifyResult<String> {
        if self.fail {
            return Err(NotificationError::Sms("provider unavailable".into()));
        }
        self.sms
            .lock()
            .await
            .push((phone_number.to_string(), message.to_string()));
        Ok("sms-1".to_string())
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_email(&self, message: EmailMessage) -> NotifyResult<String> {
        if self.fail || self.email_down.load(Ordering::SeqCst) {
            return Err(NotificationError::Email("provider unavailable".into()));
        }
        self.emails.lock().await.push(message);
        Ok("email-1".to_string())
    }
}

/// Auth state over `repo` with in-memory session, OTP and counter stores.
pub fn auth_state(repo: &InMemoryRepository, sms: Arc<dyn SmsSender>) -> AuthState {
    let store = Arc::new(MemoryStore::new());
    let repo = Arc::new(repo.clone());
    AuthState::new(
        AuthStores {
            sessions: store.clone(),
            otps: store.clone(),
            counters: store,
            session_metadata: repo.clone(),
            accounts: repo.clone(),
            security_events: repo,
            sms,
        },
        AuthConfig::new(TEST_SECRET),
    )
}

/// Stores an account whose phone is verified but email is not.
pub async fn phone_verified_account(repo: &InMemoryRepository, phone_number: &str) -> UserAccount {
    let now = Utc::now();
    let mut account = UserAccount::new(phone_number, now);
    account.verify_phone(now);
    repo.create_account(&account).await.unwrap();
    account
}

/// Stores an account with both phone and corporate email verified.
pub async fn verified_account(
    repo: &InMemoryRepository,
    phone_number: &str,
    email: &str,
) -> UserAccount {
    let mut account = phone_verified_account(repo, phone_number).await;
    account.verify_email(email, Utc::now());
    repo.update_account(&account).await.unwrap();
    account
}

/// Full application state over in-memory storage and a recording sender.
pub struct TestApp {
    pub state: AppState,
    pub repo: InMemoryRepository,
    pub sender: Arc<RecordingSender>,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = InMemoryRepository::new();
        let sender = Arc::new(RecordingSender::default());
        let state = AppState::in_memory(repo.clone(), sender.clone(), AuthConfig::new(TEST_SECRET));
        Self {
            state,
            repo,
            sender,
        }
    }

    /// Issues an access token for `account`.
    pub async fn token_for(&self, account: &UserAccount) -> String {
        self.state
            .auth
            .sessions
            .create_session(account, DeviceInfo::default())
            .await
            .unwrap()
            .access_token
    }
}
