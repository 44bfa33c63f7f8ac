use async_trait::async_trait;

use super::{EmailMessage, NotificationError};

pub type Result<T> = std::result::Result<T, NotificationError>;

/// Delivers text messages to phone numbers.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Sends `message` to an E.164 phone number and returns the provider message id.
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String>;
}

/// Delivers email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends the message and returns the provider message id.
    async fn send_email(&self, message: EmailMessage) -> Result<String>;
}
