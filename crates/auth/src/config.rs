use chrono::Duration;

use crate::error::AuthError;

const DEV_JWT_SECRET: &str = "officemate-development-secret-change-me-0123456789";
const MIN_SECRET_LEN: usize = 32;

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub otp_length: usize,
    pub otp_ttl: Duration,
    pub otp_max_attempts: u32,
    pub default_country_code: String,
}

impl AuthConfig {
    /// Builds a config with default lifetimes around the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: "officemate".to_string(),
            access_token_ttl: Duration::hours(1),
            refresh_token_ttl: Duration::hours(24),
            otp_length: 6,
            otp_ttl: Duration::minutes(5),
            otp_max_attempts: 3,
            default_country_code: officemate_core::account::DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `JWT_SECRET`: HS256 signing secret, at least 32 bytes (required in release builds)
    /// - `JWT_ISSUER`: Token issuer (default: `officemate`)
    /// - `JWT_ACCESS_TTL_SECS`: Access token lifetime (default: 3600)
    /// - `JWT_REFRESH_TTL_SECS`: Refresh token lifetime (default: 86400)
    /// - `OTP_TTL_SECS`: Phone OTP lifetime (default: 300)
    /// - `OTP_MAX_ATTEMPTS`: Verification attempts per OTP (default: 3)
    /// - `DEFAULT_COUNTRY_CODE`: Prefix for bare national numbers (default: `91`)
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when the secret is missing or too short.
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            Err(_) => return Err(AuthError::Config("JWT_SECRET must be set".to_string())),
        };

        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let mut config = Self::new(jwt_secret);

        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Some(secs) = env_i64("JWT_ACCESS_TTL_SECS") {
            config.access_token_ttl = Duration::seconds(secs);
        }
        if let Some(secs) = env_i64("JWT_REFRESH_TTL_SECS") {
            config.refresh_token_ttl = Duration::seconds(secs);
        }
        if let Some(secs) = env_i64("OTP_TTL_SECS") {
            config.otp_ttl = Duration::seconds(secs);
        }
        if let Some(attempts) = std::env::var("OTP_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.otp_max_attempts = attempts;
        }
        if let Ok(code) = std::env::var("DEFAULT_COUNTRY_CODE") {
            config.default_country_code = code;
        }

        Ok(config)
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|v| *v > 0)
}
