//! Application services. Each one orchestrates core rules over repository
//! trait objects and outbound senders.

mod audit_trail;
mod email_verification;
mod profile;
mod qr_codes;
mod routes;
mod safety;
mod wallet;

pub use audit_trail::AuditTrail;
pub use email_verification::{
    ChangeOrigin, EmailStores, EmailUpdateRequest, EmailVerificationService,
};
pub use profile::ProfileService;
pub use qr_codes::QrCodeService;
pub use routes::RoutePreferenceService;
pub use safety::{SafetyService, SafetySettings, SafetyStores};
pub use wallet::{
    AddFundsRequest, AddPaymentMethodRequest, AutoReloadRequest, LinkBankAccountRequest,
    WalletService, WithdrawRequest,
};
