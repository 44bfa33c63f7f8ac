//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. Services hold repository trait objects, so the storage
//! backends are chosen once here via feature flags.

use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::broadcast;

use officemate_auth::{AuthConfig, AuthState, AuthStores};
use officemate_core::auth::{CounterStore, OtpRepository, SessionRepository};
use officemate_core::notify::{EmailSender, SmsSender};
use officemate_core::storage::{
    AccountRepository, AuditLogRepository, EmailAuditRepository, EmailVerificationRepository,
    EmergencyContactRepository, FamilySharingRepository, LocationShareRepository,
    ProfileRepository, QrCodeRepository, RoutePreferenceRepository, SecurityEventRepository,
    SessionMetadataRepository, SosAlertRepository, WalletRepository,
};

use crate::config::Config;
use crate::crypto::FieldCipher;
use crate::services::{
    AuditTrail, EmailStores, EmailVerificationService, ProfileService, QrCodeService,
    RoutePreferenceService, SafetyService, SafetyStores, WalletService,
};

// ============================================================================
// Compile-time feature validation
// ============================================================================

// Session stores: exactly one must be enabled, they are mutually exclusive
#[cfg(all(feature = "memory-sessions", feature = "redis"))]
compile_error!("Cannot enable both 'memory-sessions' and 'redis' session store features");

#[cfg(not(any(feature = "memory-sessions", feature = "redis")))]
compile_error!("Must enable exactly one session store feature: 'memory-sessions' or 'redis'");

/// Every relational repository, implemented by one backend.
pub trait RelationalStore:
    AccountRepository
    + ProfileRepository
    + WalletRepository
    + QrCodeRepository
    + EmergencyContactRepository
    + FamilySharingRepository
    + SosAlertRepository
    + LocationShareRepository
    + EmailVerificationRepository
    + EmailAuditRepository
    + SessionMetadataRepository
    + SecurityEventRepository
    + AuditLogRepository
    + 'static
{
}

impl<T> RelationalStore for T where
    T: AccountRepository
        + ProfileRepository
        + WalletRepository
        + QrCodeRepository
        + EmergencyContactRepository
        + FamilySharingRepository
        + SosAlertRepository
        + LocationShareRepository
        + EmailVerificationRepository
        + EmailAuditRepository
        + SessionMetadataRepository
        + SecurityEventRepository
        + AuditLogRepository
        + 'static
{
}

/// Sessions, OTP records and rate-limit counters.
pub trait SessionStore: SessionRepository + OtpRepository + CounterStore + 'static {}

impl<T> SessionStore for T where T: SessionRepository + OtpRepository + CounterStore + 'static {}

/// Names of the active backends, reported by `/healthz`.
#[derive(Debug, Clone, Copy)]
pub struct Backends {
    pub storage: &'static str,
    pub sessions: &'static str,
    pub route_preferences: &'static str,
}

/// Outbound channels and the field cipher.
pub struct Outbound {
    pub sms: Arc<dyn SmsSender>,
    pub email: Arc<dyn EmailSender>,
    pub cipher: Arc<dyn FieldCipher>,
}

/// Shared application state.
///
/// This is cloned for each request handler. Every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub email_verification: EmailVerificationService,
    pub profiles: ProfileService,
    pub routes: RoutePreferenceService,
    pub wallets: WalletService,
    pub qr_codes: QrCodeService,
    pub safety: SafetyService,
    pub audit: AuditTrail,
    /// Used by the cleanup workers.
    pub verifications: Arc<dyn EmailVerificationRepository>,
    pub backends: Backends,
    /// Shutdown signal for background workers.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wires every service over the given stores.
    pub fn assemble<R, S>(
        relational: Arc<R>,
        sessions: Arc<S>,
        route_preferences: Arc<dyn RoutePreferenceRepository>,
        outbound: Outbound,
        auth_config: AuthConfig,
        backends: Backends,
    ) -> Self
    where
        R: RelationalStore,
        S: SessionStore,
    {
        let auth = AuthState::new(
            AuthStores {
                sessions: sessions.clone(),
                otps: sessions.clone(),
                counters: sessions,
                session_metadata: relational.clone(),
                accounts: relational.clone(),
                security_events: relational.clone(),
                sms: outbound.sms.clone(),
            },
            auth_config,
        );

        let audit = AuditTrail::new(relational.clone());
        let routes = RoutePreferenceService::new(route_preferences);
        let wallets = WalletService::new(
            relational.clone(),
            relational.clone(),
            outbound.cipher,
            audit.clone(),
        );
        let qr_codes = QrCodeService::new(relational.clone(), relational.clone(), audit.clone());
        let profiles = ProfileService::new(
            relational.clone(),
            relational.clone(),
            relational.clone(),
            routes.clone(),
            audit.clone(),
        );
        let safety = SafetyService::new(
            SafetyStores {
                emergency_contacts: relational.clone(),
                family_contacts: relational.clone(),
                alerts: relational.clone(),
                shares: relational.clone(),
                profiles: relational.clone(),
                security_events: relational.clone(),
            },
            outbound.sms,
            audit.clone(),
        );
        let email_verification = EmailVerificationService::new(
            EmailStores {
                accounts: relational.clone(),
                verifications: relational.clone(),
                audits: relational.clone(),
                security_events: relational.clone(),
            },
            outbound.email,
            auth.mobile.clone(),
            wallets.clone(),
            audit.clone(),
        );

        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            auth,
            email_verification,
            profiles,
            routes,
            wallets,
            qr_codes,
            safety,
            audit,
            verifications: relational,
            backends,
            shutdown_tx,
        }
    }

    /// Builds the state for the compiled-in backends.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let auth_config = AuthConfig::from_env()?;

        #[cfg(any(feature = "aws", feature = "dynamodb"))]
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        #[cfg(feature = "postgres")]
        let relational = Arc::new(
            crate::storage::PgRepository::connect(
                &config.database_url,
                config.database_max_connections,
            )
            .await?,
        );
        #[cfg(not(feature = "postgres"))]
        let relational = Arc::new(crate::storage::InMemoryRepository::new());

        #[cfg(feature = "redis")]
        let sessions = Arc::new(connect_redis(&config.redis_url).await?);
        #[cfg(not(feature = "redis"))]
        let sessions = Arc::new(officemate_auth::MemoryStore::new());

        #[cfg(feature = "dynamodb")]
        let route_preferences: Arc<dyn RoutePreferenceRepository> = Arc::new(
            crate::storage::DynamoDbRepository::from_sdk_config(
                &aws_config,
                config.route_preferences_table(),
            ),
        );
        #[cfg(not(feature = "dynamodb"))]
        let route_preferences: Arc<dyn RoutePreferenceRepository> =
            Arc::new(crate::storage::InMemoryRepository::new());

        #[cfg(feature = "aws")]
        let (sms, email): (Arc<dyn SmsSender>, Arc<dyn EmailSender>) = (
            Arc::new(crate::notifications::SnsSmsSender::new(
                aws_sdk_sns::Client::new(&aws_config),
                config.sns_sender_id.clone(),
                config.sns_sms_type.clone(),
            )),
            Arc::new(crate::notifications::SesEmailSender::new(
                aws_sdk_sesv2::Client::new(&aws_config),
                &config.ses_from_email,
                &config.ses_from_name,
            )),
        );
        #[cfg(not(feature = "aws"))]
        let (sms, email): (Arc<dyn SmsSender>, Arc<dyn EmailSender>) = {
            let sender = Arc::new(crate::notifications::LoggingSender::new());
            (sender.clone(), sender)
        };

        #[cfg(feature = "aws")]
        let kms: Option<Arc<dyn FieldCipher>> = config.kms_key_id.as_ref().map(|key_id| {
            Arc::new(crate::crypto::KmsCipher::new(
                aws_sdk_kms::Client::new(&aws_config),
                key_id.clone(),
            )) as Arc<dyn FieldCipher>
        });
        #[cfg(not(feature = "aws"))]
        let kms: Option<Arc<dyn FieldCipher>> = None;

        let cipher = select_cipher(config, kms)?;

        let backends = Backends {
            storage: if cfg!(feature = "postgres") {
                "postgres"
            } else {
                "inmemory"
            },
            sessions: if cfg!(feature = "redis") {
                "redis"
            } else {
                "memory"
            },
            route_preferences: if cfg!(feature = "dynamodb") {
                "dynamodb"
            } else {
                "inmemory"
            },
        };

        tracing::info!(
            storage = backends.storage,
            sessions = backends.sessions,
            route_preferences = backends.route_preferences,
            "Application state initialized"
        );

        Ok(Self::assemble(
            relational,
            sessions,
            route_preferences,
            Outbound { sms, email, cipher },
            auth_config,
            backends,
        ))
    }

    /// State over one in-memory repository, with `sender` for SMS and email.
    #[cfg(test)]
    pub fn in_memory<T>(
        repo: crate::storage::InMemoryRepository,
        sender: Arc<T>,
        auth_config: AuthConfig,
    ) -> Self
    where
        T: SmsSender + EmailSender + 'static,
    {
        let repo = Arc::new(repo);
        Self::assemble(
            repo.clone(),
            Arc::new(officemate_auth::MemoryStore::new()),
            repo,
            Outbound {
                sms: sender.clone(),
                email: sender,
                cipher: Arc::new(crate::crypto::LocalCipher::development()),
            },
            auth_config,
            Backends {
                storage: "inmemory",
                sessions: "memory",
                route_preferences: "inmemory",
            },
        )
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal background workers to stop.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// KMS when configured, else the local key. Debug builds fall back to a fixed
/// development key.
fn select_cipher(
    config: &Config,
    kms: Option<Arc<dyn FieldCipher>>,
) -> anyhow::Result<Arc<dyn FieldCipher>> {
    if let Some(cipher) = kms {
        tracing::info!("Field encryption via KMS");
        return Ok(cipher);
    }
    if let Some(key) = &config.field_encryption_key {
        return Ok(Arc::new(crate::crypto::LocalCipher::from_base64(key)?));
    }
    if cfg!(debug_assertions) {
        tracing::warn!("FIELD_ENCRYPTION_KEY not set, using the development key");
        return Ok(Arc::new(crate::crypto::LocalCipher::development()));
    }
    anyhow::bail!("FIELD_ENCRYPTION_KEY or KMS_KEY_ID must be set in release builds")
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> anyhow::Result<officemate_auth::RedisStore> {
    use fred::prelude::{Builder, ClientLike, Config as RedisConfig};

    let config = RedisConfig::from_url(url)?;
    let pool = Builder::from_config(config).build_pool(4)?;
    pool.init().await?;
    tracing::info!("Connected to Redis");
    Ok(officemate_auth::RedisStore::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_builds_require_a_key() {
        let mut config = Config::from_env();
        config.field_encryption_key = None;

        let result = select_cipher(&config, None);

        if cfg!(debug_assertions) {
            assert!(result.is_ok());
        } else {
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_explicit_key_is_validated() {
        let mut config = Config::from_env();
        config.field_encryption_key = Some("not base64!".to_string());

        assert!(select_cipher(&config, None).is_err());
    }
}
