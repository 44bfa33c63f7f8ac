//! HTTP handlers for auth routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use officemate_core::audit::{SecurityEvent, SecurityEventType, Severity};
use officemate_core::auth::{DeviceInfo, SessionEndReason, SessionId, SessionMetadata, UserSession};

use crate::error::AuthError;
use crate::extractors::CurrentUser;
use crate::mobile::{OtpChallenge, TokenResponse};
use crate::sessions::RefreshedToken;
use crate::AuthState;

/// Body for endpoints that start from a phone number.
#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    pub phone_number: String,
}

/// Body for OTP verification endpoints.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
}

impl VerifyOtpRequest {
    fn device(&self) -> DeviceInfo {
        DeviceInfo::from_parts(
            self.device_type.clone(),
            self.device_id.clone(),
            self.app_version.clone(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// A live session as shown to its owner.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub device: DeviceInfo,
    pub created_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub current: bool,
}

impl SessionView {
    fn new(session: UserSession, current_session_id: &str) -> Self {
        Self {
            current: session.session_id.as_str() == current_session_id,
            session_id: session.session_id.to_string(),
            device: session.device,
            created_at: session.created_at,
            last_access_at: session.last_access_at,
            expires_at: session.expires_at,
        }
    }
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `POST /auth/register` - Register a phone number and send an OTP
/// - `POST /auth/verify-mobile-otp` - Complete registration
/// - `POST /auth/login` - Send a login OTP
/// - `POST /auth/verify-login-otp` - Complete login
/// - `POST /auth/refresh` - Exchange a refresh token for a new access token
/// - `POST /auth/logout` - End current session
/// - `POST /auth/logout-all` - End all sessions for current user
/// - `POST /auth/request-mobile-otp` - Send an OTP to the caller's phone
/// - `GET /auth/sessions` - List live sessions
/// - `DELETE /auth/sessions/{session_id}` - End one session
/// - `DELETE /auth/sessions/device/{device_id}` - End a device's sessions
/// - `GET /auth/sessions/history` - Session history
/// - `GET /auth/health` - Liveness of the auth module
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-mobile-otp", post(verify_mobile_otp))
        .route("/auth/login", post(login))
        .route("/auth/verify-login-otp", post(verify_login_otp))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/request-mobile-otp", post(request_mobile_otp))
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/history", get(session_history))
        .route("/auth/sessions/{session_id}", delete(revoke_session))
        .route(
            "/auth/sessions/device/{device_id}",
            delete(revoke_device_sessions),
        )
        .route("/auth/health", get(health))
}

async fn register(
    State(state): State<AuthState>,
    Json(request): Json<PhoneRequest>,
) -> Result<(StatusCode, Json<OtpChallenge>), AuthError> {
    let challenge = state.mobile.register(&request.phone_number).await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

async fn verify_mobile_otp(
    State(state): State<AuthState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = state
        .mobile
        .verify_registration_otp(&request.phone_number, &request.otp, request.device())
        .await?;
    Ok(Json(response))
}

async fn login(
    State(state): State<AuthState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<OtpChallenge>, AuthError> {
    Ok(Json(state.mobile.login(&request.phone_number).await?))
}

async fn verify_login_otp(
    State(state): State<AuthState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = state
        .mobile
        .verify_login_otp(&request.phone_number, &request.otp, request.device())
        .await?;
    Ok(Json(response))
}

async fn refresh(
    State(state): State<AuthState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshedToken>, AuthError> {
    Ok(Json(
        state.sessions.refresh_session(&request.refresh_token).await?,
    ))
}

async fn logout(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Value>, AuthError> {
    state
        .sessions
        .revoke_session(
            &SessionId::new(claims.session_id.clone()),
            SessionEndReason::UserLogout,
        )
        .await?;

    record_event(
        &state,
        claims.user_id,
        SecurityEventType::SessionRevoked,
        format!("User logged out of session {}", claims.session_id),
    )
    .await;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

async fn logout_all(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Value>, AuthError> {
    let revoked = state
        .sessions
        .revoke_all_sessions(claims.user_id, SessionEndReason::UserLogout)
        .await?;

    record_event(
        &state,
        claims.user_id,
        SecurityEventType::AllSessionsRevoked,
        format!("User logged out of {} sessions", revoked),
    )
    .await;

    Ok(Json(json!({
        "message": "Logged out from all devices",
        "sessions_revoked": revoked,
    })))
}

async fn request_mobile_otp(
    State(state): State<AuthState>,
    current: CurrentUser,
) -> Result<Json<OtpChallenge>, AuthError> {
    Ok(Json(
        state.mobile.request_mobile_otp(current.user_id()).await?,
    ))
}

async fn list_sessions(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Value>, AuthError> {
    let sessions: Vec<SessionView> = state
        .sessions
        .user_sessions(claims.user_id)
        .await?
        .into_iter()
        .map(|s| SessionView::new(s, &claims.session_id))
        .collect();

    Ok(Json(json!({
        "active_sessions": sessions.len(),
        "sessions": sessions,
    })))
}

async fn session_history(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<SessionMetadata>>, AuthError> {
    Ok(Json(state.sessions.session_history(claims.user_id).await?))
}

async fn revoke_session(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    state
        .sessions
        .revoke_user_session(
            claims.user_id,
            &SessionId::new(session_id.clone()),
            SessionEndReason::UserLogout,
        )
        .await?;

    record_event(
        &state,
        claims.user_id,
        SecurityEventType::SessionRevoked,
        format!("Session {} revoked by user", session_id),
    )
    .await;

    Ok(Json(json!({ "message": "Session revoked" })))
}

async fn revoke_device_sessions(
    State(state): State<AuthState>,
    CurrentUser(claims): CurrentUser,
    Path(device_id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    let revoked = state
        .sessions
        .revoke_device_sessions(claims.user_id, &device_id)
        .await?;

    record_event(
        &state,
        claims.user_id,
        SecurityEventType::DeviceSessionsRevoked,
        format!("{} sessions revoked for device {}", revoked, device_id),
    )
    .await;

    Ok(Json(json!({
        "message": "Device sessions revoked",
        "sessions_revoked": revoked,
    })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP", "service": "auth" }))
}

async fn record_event(
    state: &AuthState,
    user_id: Uuid,
    event_type: SecurityEventType,
    description: String,
) {
    let event = SecurityEvent::new(
        Some(user_id),
        event_type,
        Severity::Low,
        description,
        Utc::now(),
    );
    if let Err(e) = state.security_events.record_event(&event).await {
        tracing::error!(error = %e, "Failed to record security event");
    }
}
