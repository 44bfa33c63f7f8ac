//! Outbound SMS and email.
//!
//! With the `aws` feature messages go through SNS and SES v2. Otherwise the
//! logging sender records each delivery with the recipient masked.

mod logging;
#[cfg(feature = "aws")]
mod ses;
#[cfg(feature = "aws")]
mod sns;

pub use logging::LoggingSender;
#[cfg(feature = "aws")]
pub use ses::SesEmailSender;
#[cfg(feature = "aws")]
pub use sns::SnsSmsSender;
