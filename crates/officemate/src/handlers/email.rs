use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use officemate_auth::CurrentUser;
use officemate_core::email::VerificationResponse;

use crate::handlers::AppError;
use crate::services::{ChangeOrigin, EmailUpdateRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddEmailRequest {
    pub corporate_email: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailOtpRequest {
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveEmailRequest {
    pub mobile_otp: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Client address and agent for the email change audit trail.
fn change_origin(headers: &HeaderMap) -> ChangeOrigin {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ChangeOrigin {
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip")),
        user_agent: header(USER_AGENT.as_str()),
    }
}

/// Send a verification code to a corporate email (POST /auth/add-corporate-email).
pub async fn add_corporate_email(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<AddEmailRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    let response = state
        .email_verification
        .send_email_otp(current.user_id(), &request.corporate_email)
        .await?;
    Ok(Json(response))
}

/// Confirm the emailed code (POST /auth/verify-email-otp).
pub async fn verify_email_otp(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<EmailOtpRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    let response = state
        .email_verification
        .verify_email_otp(current.user_id(), &request.otp)
        .await?;
    Ok(Json(response))
}

/// POST /auth/resend-email-otp
pub async fn resend_email_otp(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<VerificationResponse>, AppError> {
    let response = state
        .email_verification
        .resend_email_otp(current.user_id())
        .await?;
    Ok(Json(response))
}

/// Start a mobile-OTP authorized email change (POST /auth/update-corporate-email).
pub async fn update_corporate_email(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Json(request): Json<EmailUpdateRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    let response = state
        .email_verification
        .initiate_email_update(current.user_id(), &request, change_origin(&headers))
        .await?;
    Ok(Json(response))
}

/// POST /auth/complete-email-update
pub async fn complete_email_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<EmailOtpRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    let response = state
        .email_verification
        .complete_email_update(current.user_id(), &request.otp)
        .await?;
    Ok(Json(response))
}

/// Detach the corporate email (DELETE /auth/corporate-email).
pub async fn remove_corporate_email(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Json(request): Json<RemoveEmailRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state
        .email_verification
        .remove_corporate_email(
            current.user_id(),
            &request.mobile_otp,
            request.reason,
            change_origin(&headers),
        )
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Corporate email removed" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_origin_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.1".parse().unwrap());
        headers.insert(USER_AGENT, "OfficeMate/2.3 (Android)".parse().unwrap());

        let origin = change_origin(&headers);

        assert_eq!(origin.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(origin.user_agent.as_deref(), Some("OfficeMate/2.3 (Android)"));
    }

    #[test]
    fn test_change_origin_without_headers() {
        let origin = change_origin(&HeaderMap::new());
        assert!(origin.ip_address.is_none());
        assert!(origin.user_agent.is_none());
    }
}
