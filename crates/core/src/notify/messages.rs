use crate::email::mask_email;

/// A single outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

const EMAIL_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background-color: #4CAF50; color: white; padding: 20px; text-align: center; }
        .content { background-color: #f9f9f9; padding: 30px; border-radius: 5px; margin-top: 20px; }
        .otp-code { font-size: 32px; font-weight: bold; color: #4CAF50; text-align: center;
                    padding: 20px; background-color: white; border-radius: 5px; margin: 20px 0;
                    letter-spacing: 5px; }
        .footer { text-align: center; margin-top: 20px; font-size: 12px; color: #666; }
"#;

fn html_email(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>{EMAIL_STYLE}    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>OfficeMate</h1>
        </div>
        <div class="content">
{content}
        </div>
        <div class="footer">
            <p>This is an automated message from OfficeMate. Please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>
"#
    )
}

pub fn otp_sms(code: &str) -> String {
    format!(
        "Your OfficeMate verification code is: {}. Valid for 5 minutes.",
        code
    )
}

pub fn otp_email(to: &str, code: &str) -> EmailMessage {
    let content = format!(
        r#"            <h2>Verify Your Corporate Email</h2>
            <p>Thank you for registering with OfficeMate. Please use the following verification code to complete your registration:</p>
            <div class="otp-code">{code}</div>
            <p><strong>This code will expire in 10 minutes.</strong></p>
            <p>If you didn't request this verification, please ignore this email.</p>"#
    );
    EmailMessage {
        to: to.to_string(),
        subject: "OfficeMate - Verify Your Corporate Email".to_string(),
        body: html_email(&content),
        is_html: true,
    }
}

/// Both addresses are masked in the body.
pub fn email_change_notification(to: &str, old_email: &str, new_email: &str) -> EmailMessage {
    let content = format!(
        r#"            <h2>Corporate Email Changed</h2>
            <p>Your corporate email has been successfully changed.</p>
            <p><strong>Old Email:</strong> {}</p>
            <p><strong>New Email:</strong> {}</p>
            <p>If you didn't make this change, please contact support immediately.</p>"#,
        mask_email(old_email),
        mask_email(new_email)
    );
    EmailMessage {
        to: to.to_string(),
        subject: "OfficeMate - Corporate Email Changed".to_string(),
        body: html_email(&content),
        is_html: true,
    }
}

pub fn sos_alert_sms(
    user_name: &str,
    latitude: f64,
    longitude: f64,
    message: Option<&str>,
) -> String {
    let mut text = format!(
        "OfficeMate SOS: {} needs help. Last known location: https://maps.google.com/?q={:.6},{:.6}",
        user_name, latitude, longitude
    );
    if let Some(message) = message {
        text.push_str(&format!(" Message: {}", message));
    }
    text
}

pub fn location_share_sms(sharer: &str, share_token: &str) -> String {
    format!(
        "OfficeMate: {} is sharing their live location with you. Track with code {}.",
        sharer, share_token
    )
}
