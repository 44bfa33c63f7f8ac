//! Outbound SMS and email.
//!
//! The core only builds message content and defines the sender seams; the
//! binary provides SNS/SES and logging implementations.

mod error;
mod messages;
mod traits;

pub use error::NotificationError;
pub use messages::{
    email_change_notification, location_share_sms, otp_email, otp_sms, sos_alert_sms,
    EmailMessage,
};
pub use traits::{EmailSender, Result, SmsSender};
