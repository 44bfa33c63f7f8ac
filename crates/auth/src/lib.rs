//! Mobile authentication for OfficeMate.
//!
//! This crate provides:
//! - Phone OTP registration and login
//! - JWT access/refresh tokens backed by server-side sessions
//! - Rate limiting, lockouts and suspicious activity tracking
//! - Session, OTP and counter storage (in-memory or Redis via feature flag)
//! - Axum extractors and routes

mod config;
mod error;
mod extractors;
mod handlers;
mod mobile;
mod otp;
mod rate_limit;
mod sessions;
mod state;
mod stores;
#[cfg(test)]
mod test_support;
mod tokens;

pub use config::AuthConfig;
pub use error::{AuthError, ErrorBody};
pub use extractors::CurrentUser;
pub use handlers::auth_routes;
pub use mobile::{MobileAuthService, OtpChallenge, TokenResponse};
pub use otp::OtpService;
pub use rate_limit::RateLimiter;
pub use sessions::{IssuedTokens, RefreshedToken, SessionManager};
pub use state::{AuthState, AuthStores};
pub use stores::MemoryStore;
#[cfg(feature = "redis")]
pub use stores::RedisStore;
pub use tokens::TokenService;
