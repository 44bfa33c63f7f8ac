use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use officemate_core::account::mask_identifier;
use officemate_core::email::mask_email;
use officemate_core::notify::{EmailMessage, EmailSender, Result, SmsSender};

/// Sender for local development: logs deliveries instead of dispatching them.
///
/// Message bodies are only logged at `trace` level since they carry codes.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender {
    sent: Arc<AtomicU64>,
}

impl LoggingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages "sent" so far.
    #[allow(dead_code)]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }
}

#[async_trait]
impl SmsSender for LoggingSender {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String> {
        let message_id = self.next_id("local-sms");
        tracing::info!(
            to = %mask_identifier(phone_number),
            message_id = %message_id,
            "SMS delivery skipped (logging sender)"
        );
        tracing::trace!(body = %message, "SMS body");
        Ok(message_id)
    }
}

#[async_trait]
impl EmailSender for LoggingSender {
    async fn send_email(&self, message: EmailMessage) -> Result<String> {
        let message_id = self.next_id("local-email");
        tracing::info!(
            to = %mask_email(&message.to),
            subject = %message.subject,
            message_id = %message_id,
            "Email delivery skipped (logging sender)"
        );
        tracing::trace!(body = %message.body, "Email body");
        Ok(message_id)
    }
}
