use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Failed to send SMS: {0}")]
    Sms(String),
    #[error("Failed to send email: {0}")]
    Email(String),
}
