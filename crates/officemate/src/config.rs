use std::{env, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection URL (default: "postgres://localhost/officemate")
    /// Note: Only used when the `postgres` feature is enabled.
    #[allow(dead_code)]
    pub database_url: String,
    /// Maximum Postgres pool connections (default: 20)
    #[allow(dead_code)]
    pub database_max_connections: u32,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
    /// Prefix for DynamoDB table names (default: "officemate")
    #[allow(dead_code)]
    pub dynamodb_table_prefix: String,
    /// Base64 AES-256 key for local field encryption
    pub field_encryption_key: Option<String>,
    /// KMS key id or alias for field encryption (with the `aws` feature)
    #[allow(dead_code)]
    pub kms_key_id: Option<String>,
    /// SES sender address (default: "noreply@officemate.com")
    #[allow(dead_code)]
    pub ses_from_email: String,
    /// SES sender display name (default: "OfficeMate")
    #[allow(dead_code)]
    pub ses_from_name: String,
    /// SNS sender id (default: "OfficeMate")
    #[allow(dead_code)]
    pub sns_sender_id: String,
    /// SNS SMS type (default: "Transactional")
    #[allow(dead_code)]
    pub sns_sms_type: String,
    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
    /// Expired session cleanup interval in seconds (default: 3600)
    pub session_cleanup_interval_seconds: u64,
    /// Inactive session sweep interval in seconds (default: 86400)
    pub inactive_cleanup_interval_seconds: u64,
    /// Sessions idle for this many days are ended (default: 30)
    pub session_inactivity_days: i64,
    /// Expired email verification cleanup interval in seconds (default: 3600)
    pub email_cleanup_interval_seconds: u64,
    /// Verified email verifications older than this many days are purged (default: 30)
    pub verification_retention_days: i64,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn string_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - Postgres connection URL
    /// - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 20)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `DYNAMODB_TABLE_PREFIX` - Table prefix (default: "officemate")
    /// - `FIELD_ENCRYPTION_KEY` - Base64 32-byte key for local AES-GCM
    /// - `KMS_KEY_ID` - KMS key for field encryption
    /// - `SES_FROM_EMAIL`, `SES_FROM_NAME` - Email sender
    /// - `SNS_SENDER_ID`, `SNS_SMS_TYPE` - SMS attributes
    /// - `REQUEST_TIMEOUT_SECONDS` - Per-request timeout (default: 10)
    /// - `SESSION_CLEANUP_INTERVAL_SECONDS` (default: 3600)
    /// - `INACTIVE_CLEANUP_INTERVAL_SECONDS` (default: 86400)
    /// - `SESSION_INACTIVITY_DAYS` (default: 30)
    /// - `EMAIL_CLEANUP_INTERVAL_SECONDS` (default: 3600)
    /// - `VERIFICATION_RETENTION_DAYS` (default: 30)
    pub fn from_env() -> Self {
        Self {
            database_url: string_env("DATABASE_URL", "postgres://localhost/officemate"),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 20),
            redis_url: string_env("REDIS_URL", "redis://localhost:6379"),
            dynamodb_table_prefix: string_env("DYNAMODB_TABLE_PREFIX", "officemate"),
            field_encryption_key: env::var("FIELD_ENCRYPTION_KEY").ok(),
            kms_key_id: env::var("KMS_KEY_ID").ok(),
            ses_from_email: string_env("SES_FROM_EMAIL", "noreply@officemate.com"),
            ses_from_name: string_env("SES_FROM_NAME", "OfficeMate"),
            sns_sender_id: string_env("SNS_SENDER_ID", "OfficeMate"),
            sns_sms_type: string_env("SNS_SMS_TYPE", "Transactional"),
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS", 10),
            session_cleanup_interval_seconds: parse_env("SESSION_CLEANUP_INTERVAL_SECONDS", 3600),
            inactive_cleanup_interval_seconds: parse_env(
                "INACTIVE_CLEANUP_INTERVAL_SECONDS",
                86_400,
            ),
            session_inactivity_days: parse_env("SESSION_INACTIVITY_DAYS", 30),
            email_cleanup_interval_seconds: parse_env("EMAIL_CLEANUP_INTERVAL_SECONDS", 3600),
            verification_retention_days: parse_env("VERIFICATION_RETENTION_DAYS", 30),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Name of the DynamoDB route preferences table.
    #[allow(dead_code)]
    pub fn route_preferences_table(&self) -> String {
        format!("{}_route_preferences", self.dynamodb_table_prefix)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
