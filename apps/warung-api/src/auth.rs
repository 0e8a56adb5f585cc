//! JWT authentication.
//!
//! `POST /login` trades a username/password for an access token; every
//! other route (except `/health` and `/ws/{id}`) expects
//! `Authorization: Bearer <token>` when auth is enabled.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use warung_core::{User, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate an access token for `user`.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::Unauthorized("Token tidak valid".to_string())
        })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// Middleware guarding the protected routes. The decoded [`Claims`] are
/// stored in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Token diperlukan".to_string()))?;

    let claims = state.jwt.validate_token(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "USR001".into(),
            username: "kasir".into(),
            password_hash: String::new(),
            name: "Kasir Depan".into(),
            role: UserRole::Seller,
            phone: None,
            gender: None,
            address: None,
            is_active: true,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-0123456789".to_string(), 3600);
        let token = manager.generate_token(&user()).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "USR001");
        assert_eq!(claims.username, "kasir");
        assert_eq!(claims.role, UserRole::Seller);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("secret-a-0123456789".into(), 3600)
            .generate_token(&user())
            .unwrap();
        let result = JwtManager::new("secret-b-0123456789".into(), 3600).validate_token(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // default validation allows 60s of leeway
        let manager = JwtManager::new("test-secret-0123456789".into(), -120);
        let token = manager.generate_token(&user()).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
