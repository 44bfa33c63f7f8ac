use async_trait::async_trait;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client;
use officemate_core::account::mask_identifier;
use officemate_core::notify::{NotificationError, Result, SmsSender};

/// SMS delivery through SNS `Publish` to a phone number.
#[derive(Clone)]
pub struct SnsSmsSender {
    client: Client,
    sender_id: String,
    sms_type: String,
}

impl SnsSmsSender {
    pub fn new(client: Client, sender_id: impl Into<String>, sms_type: impl Into<String>) -> Self {
        Self {
            client,
            sender_id: sender_id.into(),
            sms_type: sms_type.into(),
        }
    }

    fn attribute(value: &str) -> Result<MessageAttributeValue> {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .map_err(|e| NotificationError::Sms(e.to_string()))
    }
}

#[async_trait]
impl SmsSender for SnsSmsSender {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String> {
        let response = self
            .client
            .publish()
            .phone_number(phone_number)
            .message(message)
            .message_attributes("AWS.SNS.SMS.SMSType", Self::attribute(&self.sms_type)?)
            .message_attributes("AWS.SNS.SMS.SenderID", Self::attribute(&self.sender_id)?)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    to = %mask_identifier(phone_number),
                    error = %e,
                    "Failed to send SMS"
                );
                NotificationError::Sms(e.to_string())
            })?;

        let message_id = response.message_id().unwrap_or_default().to_string();
        tracing::info!(
            to = %mask_identifier(phone_number),
            message_id = %message_id,
            "SMS sent"
        );
        Ok(message_id)
    }
}
