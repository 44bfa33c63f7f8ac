use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client;
use officemate_core::email::mask_email;
use officemate_core::notify::{EmailMessage, EmailSender, NotificationError, Result};

/// Email delivery through SES v2 `SendEmail`.
#[derive(Clone)]
pub struct SesEmailSender {
    client: Client,
    from: String,
}

impl SesEmailSender {
    pub fn new(client: Client, from_email: &str, from_name: &str) -> Self {
        Self {
            client,
            from: format!("{} <{}>", from_name, from_email),
        }
    }
}

fn utf8(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| NotificationError::Email(e.to_string()))
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send_email(&self, message: EmailMessage) -> Result<String> {
        let body = if message.is_html {
            Body::builder().html(utf8(&message.body)?).build()
        } else {
            Body::builder().text(utf8(&message.body)?).build()
        };
        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(utf8(&message.subject)?)
                    .body(body)
                    .build(),
            )
            .build();

        let response = self
            .client
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(&message.to).build())
            .content(content)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(to = %mask_email(&message.to), error = %e, "Failed to send email");
                NotificationError::Email(e.to_string())
            })?;

        let message_id = response.message_id().unwrap_or_default().to_string();
        tracing::info!(
            to = %mask_email(&message.to),
            message_id = %message_id,
            "Email sent"
        );
        Ok(message_id)
    }
}
