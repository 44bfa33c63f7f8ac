//! Repository traits and shared storage types.
//!
//! Implementations live in the binary crate (Postgres, in-memory, DynamoDB).

mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
#[cfg(feature = "auth")]
pub use traits::SessionMetadataRepository;
pub use traits::{
    AccountRepository, AuditLogRepository, EmailAuditRepository, EmailVerificationRepository,
    EmergencyContactRepository, FamilySharingRepository, LocationShareRepository,
    ProfileRepository, QrCodeRepository, RoutePreferenceRepository, SecurityEventRepository,
    SosAlertRepository, WalletRepository,
};
pub use types::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
