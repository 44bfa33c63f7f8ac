//! HS256 JWT issuing and validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use officemate_core::account::AccountStatus;
use officemate_core::auth::{
    generate_token_id, AccessClaims, AuthError, RefreshClaims, TokenType, UserSession,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AuthConfig;

/// Signs and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        self.refresh_ttl
    }

    /// Issues an access token carrying the session's verification state.
    pub fn issue_access_token(
        &self,
        session: &UserSession,
        account_status: AccountStatus,
        now: DateTime<Utc>,
    ) -> Result<(String, AccessClaims), AuthError> {
        let claims = AccessClaims {
            sub: session.user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: generate_token_id(),
            user_id: session.user_id,
            session_id: session.session_id.to_string(),
            mobile_verified: session.mobile_verified,
            email_verified: session.email_verified,
            account_status,
            permissions: session.permissions.clone(),
            token_type: TokenType::Access,
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Issues the refresh token whose `jti` is recorded on the session.
    pub fn issue_refresh_token(
        &self,
        session: &UserSession,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = RefreshClaims {
            sub: session.user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
            jti: session.refresh_token_id.clone(),
            user_id: session.user_id,
            session_id: session.session_id.to_string(),
            token_type: TokenType::Refresh,
        };
        self.sign(&claims)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode_typed(token, TokenType::Access)
    }

    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.decode_typed(token, TokenType::Refresh)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Storage(format!("failed to sign token: {}", e)))
    }

    /// Verifies signature, issuer and expiry, then checks `token_type` before
    /// deserializing the full claim set.
    fn decode_typed<T: DeserializeOwned>(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<T, AuthError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        let token_type: TokenType = data
            .claims
            .get("token_type")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or(AuthError::MalformedToken)?;

        if token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected: expected.as_str(),
            });
        }

        serde_json::from_value(data.claims).map_err(|_| AuthError::MalformedToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use officemate_core::auth::{generate_session_id, permissions_for, DeviceInfo};
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret-that-is-at-least-32-bytes-long")
    }

    fn session(now: DateTime<Utc>) -> UserSession {
        UserSession {
            session_id: generate_session_id(),
            user_id: Uuid::new_v4(),
            device: DeviceInfo::default(),
            permissions: permissions_for(true, false, AccountStatus::PendingEmail),
            mobile_verified: true,
            email_verified: false,
            refresh_token_id: generate_token_id(),
            created_at: now,
            last_access_at: now,
            expires_at: now + Duration::hours(24),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = TokenService::new(&config());
        let now = Utc::now();
        let session = session(now);

        let (token, issued) = service
            .issue_access_token(&session, AccountStatus::PendingEmail, now)
            .unwrap();
        let decoded = service.decode_access_token(&token).unwrap();

        assert_eq!(decoded, issued);
        assert_eq!(decoded.iss, "officemate");
        assert_eq!(decoded.session_id, session.session_id.to_string());
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn test_refresh_token_carries_session_token_id() {
        let service = TokenService::new(&config());
        let now = Utc::now();
        let session = session(now);

        let token = service.issue_refresh_token(&session, now).unwrap();
        let claims = service.decode_refresh_token(&token).unwrap();

        assert_eq!(claims.jti, session.refresh_token_id);
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_wrong_token_type_is_rejected() {
        let service = TokenService::new(&config());
        let now = Utc::now();
        let token = service.issue_refresh_token(&session(now), now).unwrap();

        assert_eq!(
            service.decode_access_token(&token),
            Err(AuthError::WrongTokenType {
                expected: "ACCESS"
            })
        );
    }

    #[test]
    fn test_expired_token() {
        let service = TokenService::new(&config());
        let issued_at = Utc::now() - Duration::hours(2);
        let (token, _) = service
            .issue_access_token(&session(issued_at), AccountStatus::Active, issued_at)
            .unwrap();

        assert_eq!(
            service.decode_access_token(&token),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let now = Utc::now();
        let other = TokenService::new(&AuthConfig::new("another-secret-that-is-also-32-bytes!!"));
        let (token, _) = other
            .issue_access_token(&session(now), AccountStatus::Active, now)
            .unwrap();

        let service = TokenService::new(&config());
        assert_eq!(
            service.decode_access_token(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = TokenService::new(&config());
        assert_eq!(
            service.decode_access_token("not.a.jwt"),
            Err(AuthError::MalformedToken)
        );
    }
}
