//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use officemate_core::auth::{AccessClaims, Permission};
use uuid::Uuid;

use crate::error::AuthError;
use crate::AuthState;

/// Extractor for an authenticated caller. Rejects with 401 unless the request
/// carries a valid Bearer access token whose session is still live.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

impl CurrentUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.0.session_id
    }

    /// Only the owner may act on `/users/{user_id}` resources.
    pub fn ensure_owner(&self, user_id: Uuid) -> Result<(), AuthError> {
        if self.0.user_id == user_id {
            Ok(())
        } else {
            Err(AuthError::Forbidden("Access denied"))
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.0.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden("Insufficient permissions"))
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::Unauthorized("Missing authorization header"))?
            .to_str()
            .map_err(|_| AuthError::Unauthorized("Invalid authorization header"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized("Invalid authorization header"))?;

        let claims = auth_state.sessions.validate_access_token(token).await?;

        Ok(CurrentUser(claims))
    }
}
