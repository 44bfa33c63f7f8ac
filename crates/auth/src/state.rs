//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use officemate_core::auth::{CounterStore, OtpRepository, SessionRepository};
use officemate_core::notify::SmsSender;
use officemate_core::storage::{
    AccountRepository, SecurityEventRepository, SessionMetadataRepository,
};

use crate::config::AuthConfig;
use crate::mobile::MobileAuthService;
use crate::otp::OtpService;
use crate::rate_limit::RateLimiter;
use crate::sessions::SessionManager;
use crate::tokens::TokenService;

/// Storage and delivery backends the auth services run on.
pub struct AuthStores {
    pub sessions: Arc<dyn SessionRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub counters: Arc<dyn CounterStore>,
    pub session_metadata: Arc<dyn SessionMetadataRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub security_events: Arc<dyn SecurityEventRepository>,
    pub sms: Arc<dyn SmsSender>,
}

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub tokens: TokenService,
    pub limiter: RateLimiter,
    pub otp: OtpService,
    pub sessions: SessionManager,
    pub mobile: MobileAuthService,
    pub accounts: Arc<dyn AccountRepository>,
    pub security_events: Arc<dyn SecurityEventRepository>,
}

impl AuthState {
    /// Wires the auth services over the given stores.
    pub fn new(stores: AuthStores, config: AuthConfig) -> Self {
        let tokens = TokenService::new(&config);
        let limiter = RateLimiter::new(stores.counters);
        let otp = OtpService::new(
            stores.otps,
            stores.sms,
            limiter.clone(),
            config.clone(),
        );
        let sessions = SessionManager::new(
            stores.sessions,
            stores.session_metadata,
            stores.accounts.clone(),
            tokens.clone(),
        );
        let mobile = MobileAuthService::new(
            stores.accounts.clone(),
            stores.security_events.clone(),
            otp.clone(),
            limiter.clone(),
            sessions.clone(),
            config.clone(),
        );

        Self {
            config,
            tokens,
            limiter,
            otp,
            sessions,
            mobile,
            accounts: stores.accounts,
            security_events: stores.security_events,
        }
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
